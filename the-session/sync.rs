//! Reconciling a document value into the live view.
//!
//! A pass runs in two phases. The synchronous phase replaces the buffer text
//! when it differs and updates the editable slot before [`sync`] returns, so
//! the text is visible and editable without waiting on anything. The
//! asynchronous phase resolves the language binding, installs it, restores
//! the scroll position and finally takes focus.
//!
//! Every pass is tagged with a generation. A newer pass aborts the task of
//! the previous one, and a completion whose generation is no longer current
//! is dropped, so the most recently requested document's binding always
//! wins.
//!
//! [`sync`]: DocumentSynchronizer::sync

use std::{
  fmt,
  path::PathBuf,
  sync::Arc,
};

use parking_lot::Mutex;
use the_lib::{
  document::Document,
  effect::Effect,
  extension::LanguageSlot,
  syntax::LanguageSupport,
  syntax_async::ResolveLifecycle,
  transaction::Transaction,
  view::ScrollOffset,
};
use tokio::{
  sync::oneshot,
  task::JoinHandle,
};

use crate::{
  language::LanguageLoader,
  session::SessionError,
  view::{
    View,
    ViewError,
    WeakViewHandle,
  },
};

/// How a pass acquired focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  /// The view was already at the target offset.
  Immediate,
  /// Focus followed the first scroll event after the scroll request.
  AfterScroll,
  /// Auto focus was not requested or the view is not editable.
  NotRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
  /// The binding was installed and the scroll restored.
  Installed {
    language: Option<LanguageSupport>,
    focus:    Focus,
  },
  /// A newer pass started before this one finished.
  Superseded,
  /// The view was unmounted while the pass was in flight.
  Detached,
  /// No runtime was available for the asynchronous phase.
  Skipped,
}

/// Returned once the synchronous phase of a pass is done.
#[must_use]
pub struct SyncTicket {
  generation: u64,
  replaced:   bool,
  settled:    Option<oneshot::Receiver<SyncOutcome>>,
}

impl SyncTicket {
  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Whether the buffer text was replaced.
  pub fn replaced(&self) -> bool {
    self.replaced
  }

  /// Wait for the asynchronous phase.
  pub async fn settled(self) -> SyncOutcome {
    match self.settled {
      Some(rx) => rx.await.unwrap_or(SyncOutcome::Superseded),
      None => SyncOutcome::Skipped,
    }
  }
}

impl fmt::Debug for SyncTicket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SyncTicket")
      .field("generation", &self.generation)
      .field("replaced", &self.replaced)
      .finish_non_exhaustive()
  }
}

pub struct DocumentSynchronizer {
  loader:    Arc<dyn LanguageLoader>,
  lifecycle: Arc<Mutex<ResolveLifecycle>>,
  task:      Option<JoinHandle<()>>,
}

impl DocumentSynchronizer {
  pub fn new(loader: Arc<dyn LanguageLoader>) -> Self {
    Self {
      loader,
      lifecycle: Arc::new(Mutex::new(ResolveLifecycle::default())),
      task: None,
    }
  }

  /// Generation of the most recent pass.
  pub fn generation(&self) -> u64 {
    self.lifecycle.lock().latest()
  }

  pub fn sync(
    &mut self,
    view: &WeakViewHandle,
    editable: bool,
    language: &LanguageSlot,
    auto_focus: bool,
    document: &Document,
  ) -> Result<SyncTicket, SessionError> {
    let lifecycle = &self.lifecycle;
    let (generation, replaced) = view.with(|view| -> Result<_, ViewError> {
      let replaced = replace_text(view, &document.value)?;
      let tx = Transaction::effects_only(view.text(), [Effect::SetEditable(
        editable && !document.is_binary,
      )]);
      view.dispatch(&tx)?;
      // A superseded pass must not leave its scroll behind.
      view.cancel_scroll_request();
      Ok((lifecycle.lock().begin(), replaced))
    })??;

    if let Some(task) = self.task.take() {
      task.abort();
    }

    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
      log::warn!(
        "no tokio runtime, language binding for {} not resolved",
        document.path().display()
      );
      return Ok(SyncTicket {
        generation,
        replaced,
        settled: None,
      });
    };

    let pass = Pass {
      view: view.clone(),
      loader: self.loader.clone(),
      lifecycle: self.lifecycle.clone(),
      generation,
      slot: *language,
      path: document.file_path.clone(),
      target: document.scroll_target(),
      focus: auto_focus && editable,
    };
    let (tx, rx) = oneshot::channel();
    self.task = Some(runtime.spawn(async move {
      let _ = tx.send(pass.run().await);
    }));

    Ok(SyncTicket {
      generation,
      replaced,
      settled: Some(rx),
    })
  }

  /// Abort the in-flight pass, if any. Its result is never installed.
  pub fn cancel(&mut self) {
    self.lifecycle.lock().cancel_pending();
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl Drop for DocumentSynchronizer {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl fmt::Debug for DocumentSynchronizer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DocumentSynchronizer")
      .field("lifecycle", &*self.lifecycle.lock())
      .field("in_flight", &self.task.is_some())
      .finish_non_exhaustive()
  }
}

fn replace_text(view: &mut View, value: &str) -> Result<bool, ViewError> {
  if view.state().buffer().text_eq(value) {
    return Ok(false);
  }
  let tx = Transaction::replace_all(view.text(), value)?;
  view.dispatch(&tx)?;
  Ok(true)
}

struct Pass {
  view:       WeakViewHandle,
  loader:     Arc<dyn LanguageLoader>,
  lifecycle:  Arc<Mutex<ResolveLifecycle>>,
  generation: u64,
  slot:       LanguageSlot,
  path:       PathBuf,
  target:     ScrollOffset,
  focus:      bool,
}

enum Installed {
  Stale,
  Done(Focus),
  AwaitScroll(oneshot::Receiver<ScrollOffset>),
}

impl Pass {
  async fn run(self) -> SyncOutcome {
    let language = self.loader.resolve(&self.path).await;

    let installed = self.view.with(|view| self.install(view, language));
    let focus = match installed {
      Err(_) => return SyncOutcome::Detached,
      Ok(Installed::Stale) => return SyncOutcome::Superseded,
      Ok(Installed::Done(focus)) => focus,
      Ok(Installed::AwaitScroll(signal)) => {
        if signal.await.is_err() {
          return if self.lifecycle.lock().is_current(self.generation) {
            SyncOutcome::Detached
          } else {
            SyncOutcome::Superseded
          };
        }
        let focused = self.view.with(|view| {
          if !self.lifecycle.lock().is_current(self.generation) {
            return false;
          }
          view.focus();
          true
        });
        match focused {
          Ok(true) => Focus::AfterScroll,
          Ok(false) => return SyncOutcome::Superseded,
          Err(_) => return SyncOutcome::Detached,
        }
      },
    };

    SyncOutcome::Installed { language, focus }
  }

  fn install(&self, view: &mut View, language: Option<LanguageSupport>) -> Installed {
    if !self.lifecycle.lock().complete(self.generation) {
      log::debug!(
        "dropping stale language binding for {} (generation {})",
        self.path.display(),
        self.generation
      );
      return Installed::Stale;
    }

    let tx = Transaction::effects_only(view.text(), [Effect::ReconfigureLanguage {
      slot:    self.slot.id(),
      binding: language,
    }]);
    if let Err(err) = view.dispatch(&tx) {
      log::warn!("failed to install language binding: {err}");
    }

    if !self.focus {
      view.scroll_to(self.target);
      return Installed::Done(Focus::NotRequested);
    }
    if !view.scroll_to(self.target) {
      view.focus();
      return Installed::Done(Focus::Immediate);
    }
    Installed::AwaitScroll(view.once_scroll())
  }
}

#[cfg(test)]
mod tests {
  use std::{
    path::Path,
    time::Duration,
  };

  use async_trait::async_trait;
  use the_lib::{
    config::SessionConfig,
    syntax::language_for_path,
  };

  use super::*;
  use crate::{
    container::Container,
    factory::{
      ViewCallbacks,
      create_view,
    },
    view::ViewHandle,
  };

  /// Resolves after a short delay, or a long one for files named `slow`.
  struct DelayLoader;

  #[async_trait]
  impl LanguageLoader for DelayLoader {
    async fn resolve(&self, path: &Path) -> Option<LanguageSupport> {
      let delay = if path.file_stem().is_some_and(|stem| stem == "slow") {
        500
      } else {
        10
      };
      tokio::time::sleep(Duration::from_millis(delay)).await;
      language_for_path(path)
    }
  }

  fn mounted(slot: &LanguageSlot) -> ViewHandle {
    create_view(
      &Container::new("editor"),
      &SessionConfig::default(),
      ViewCallbacks::default(),
      [slot.of(None)],
    )
    .unwrap()
  }

  #[tokio::test(start_paused = true)]
  async fn text_and_editable_are_synchronous() {
    let slot = LanguageSlot::new();
    let handle = mounted(&slot);
    let weak = handle.downgrade();
    let mut sync = DocumentSynchronizer::new(Arc::new(DelayLoader));

    let doc = Document::new("main.ts", "let a = 1;").binary(true);
    let ticket = sync.sync(&weak, true, &slot, false, &doc).unwrap();
    assert!(ticket.replaced());
    {
      let view = handle.lock();
      assert_eq!(*view.text(), "let a = 1;");
      assert!(view.state().read_only());
      assert_eq!(view.state().language(), None);
      assert_eq!(view.state().selection().primary().head, 0);
    }

    let outcome = ticket.settled().await;
    assert_eq!(outcome, SyncOutcome::Installed {
      language: Some(LanguageSupport::javascript(false, true)),
      focus:    Focus::NotRequested,
    });
    assert_eq!(
      handle.lock().state().language(),
      Some(LanguageSupport::javascript(false, true))
    );
  }

  #[tokio::test(start_paused = true)]
  async fn later_pass_wins_over_slow_resolution() {
    let slot = LanguageSlot::new();
    let handle = mounted(&slot);
    let weak = handle.downgrade();
    let mut sync = DocumentSynchronizer::new(Arc::new(DelayLoader));

    let first = sync
      .sync(&weak, true, &slot, false, &Document::new("slow.md", "# a"))
      .unwrap();
    let second = sync
      .sync(&weak, true, &slot, false, &Document::new("b.css", "a {}"))
      .unwrap();
    assert!(second.generation() > first.generation());

    assert_eq!(first.settled().await, SyncOutcome::Superseded);
    assert!(matches!(
      second.settled().await,
      SyncOutcome::Installed { .. }
    ));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
      handle.lock().state().language(),
      language_for_path(Path::new("b.css"))
    );
  }

  #[tokio::test(start_paused = true)]
  async fn focus_waits_for_scroll() {
    let slot = LanguageSlot::new();
    let handle = mounted(&slot);
    let weak = handle.downgrade();
    let mut sync = DocumentSynchronizer::new(Arc::new(DelayLoader));

    let doc = Document::new("a.js", "a\nb\nc").with_scroll(ScrollOffset::new(50, 0));
    let ticket = sync.sync(&weak, true, &slot, true, &doc).unwrap();
    let settled = tokio::spawn(ticket.settled());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
      handle.lock().pending_scroll(),
      Some(ScrollOffset::new(50, 0))
    );
    assert!(!handle.lock().has_focus());

    handle.lock().settle_scroll();
    let outcome = settled.await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Installed {
      focus: Focus::AfterScroll,
      ..
    }));
    assert!(handle.lock().has_focus());
  }

  #[tokio::test(start_paused = true)]
  async fn new_pass_drops_superseded_scroll_request() {
    let slot = LanguageSlot::new();
    let handle = mounted(&slot);
    let weak = handle.downgrade();
    let mut sync = DocumentSynchronizer::new(Arc::new(DelayLoader));

    let doc = Document::new("a.js", "a\nb").with_scroll(ScrollOffset::new(50, 0));
    let first = sync.sync(&weak, true, &slot, true, &doc).unwrap();
    let first = tokio::spawn(first.settled());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
      handle.lock().pending_scroll(),
      Some(ScrollOffset::new(50, 0))
    );

    let second = sync
      .sync(&weak, true, &slot, true, &Document::new("b.css", "a {}"))
      .unwrap();
    assert_eq!(first.await.unwrap(), SyncOutcome::Superseded);
    assert!(matches!(second.settled().await, SyncOutcome::Installed {
      focus: Focus::Immediate,
      ..
    }));

    let view = handle.lock();
    assert_eq!(view.pending_scroll(), None);
    assert_eq!(view.scroll_listener_count(), 0);
    assert!(view.has_focus());
  }

  #[tokio::test(start_paused = true)]
  async fn unmount_detaches_pending_pass() {
    let slot = LanguageSlot::new();
    let handle = mounted(&slot);
    let weak = handle.downgrade();
    let mut sync = DocumentSynchronizer::new(Arc::new(DelayLoader));

    let ticket = sync
      .sync(&weak, true, &slot, true, &Document::new("a.js", ""))
      .unwrap();
    handle.lock().destroy();
    assert_eq!(ticket.settled().await, SyncOutcome::Detached);
    assert!(matches!(
      sync.sync(&weak, true, &slot, true, &Document::new("a.js", "")),
      Err(SessionError::View(ViewError::Destroyed))
    ));
  }

  #[test]
  fn without_runtime_only_the_synchronous_phase_runs() {
    let slot = LanguageSlot::new();
    let handle = mounted(&slot);
    let mut sync = DocumentSynchronizer::new(Arc::new(DelayLoader));

    let ticket = sync
      .sync(&handle.downgrade(), false, &slot, true, &Document::new("a.js", "x"))
      .unwrap();
    assert_eq!(*handle.lock().text(), "x");
    assert!(handle.lock().state().read_only());
    assert_eq!(
      futures_executor::block_on(ticket.settled()),
      SyncOutcome::Skipped
    );
  }
}
