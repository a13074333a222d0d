//! The live editing view.
//!
//! A [`View`] wraps an [`EditorState`] together with the things only a mounted
//! surface has: scroll offsets, focus, the container it is attached to and the
//! host callbacks. Rendering is left to the host, which applies scroll
//! requests and reports the resulting scroll events back through
//! [`View::notify_scroll`].
//!
//! The lifecycle owner keeps the only [`ViewHandle`]. Everything else holds a
//! [`WeakViewHandle`], which stops resolving once the view is unmounted.

use std::{
  fmt,
  sync::{
    Arc,
    Weak,
  },
};

use parking_lot::{
  Mutex,
  MutexGuard,
};
use ropey::Rope;
use the_lib::{
  command::{
    self,
    DEFAULT_PAGE_LINES,
  },
  completion::CompletionItem,
  effect::Effect,
  extension::Extension,
  input::{
    KeyEvent,
    KeyOutcome,
  },
  keymap::{
    Command,
    Keymap,
  },
  state::{
    EditorState,
    StateError,
  },
  tooltip::TooltipToggle,
  transaction::{
    Transaction,
    TransactionError,
  },
  view::{
    ScrollEvent,
    ScrollOffset,
  },
};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::{
  container::Container,
  scroll::ScrollFeed,
};

#[derive(Debug, Error)]
pub enum ViewError {
  #[error("container `{container}` already hosts a view")]
  AlreadyMounted { container: String },
  #[error("view has been destroyed")]
  Destroyed,
  #[error(transparent)]
  State(#[from] StateError),
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

/// Receives the buffer text when the save key is pressed.
pub type SaveCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub struct View {
  container:        Container,
  state:            EditorState,
  keymap:           Keymap,
  on_save:          Option<SaveCallback>,
  scroll:           ScrollOffset,
  pending_scroll:   Option<ScrollOffset>,
  scroll_listeners: Vec<oneshot::Sender<ScrollOffset>>,
  scroll_reporter:  Option<ScrollFeed>,
  page_lines:       usize,
  focused:          bool,
  destroyed:        bool,
}

impl View {
  pub(crate) fn new(
    container: Container,
    state: EditorState,
    on_save: Option<SaveCallback>,
    scroll_reporter: Option<ScrollFeed>,
  ) -> Self {
    Self {
      container,
      state,
      keymap: Keymap::default(),
      on_save,
      scroll: ScrollOffset::ORIGIN,
      pending_scroll: None,
      scroll_listeners: Vec::new(),
      scroll_reporter,
      page_lines: DEFAULT_PAGE_LINES,
      focused: false,
      destroyed: false,
    }
  }

  pub fn container(&self) -> &Container {
    &self.container
  }

  pub fn state(&self) -> &EditorState {
    &self.state
  }

  pub fn text(&self) -> &Rope {
    self.state.text()
  }

  pub fn is_destroyed(&self) -> bool {
    self.destroyed
  }

  fn ensure_live(&self) -> Result<(), ViewError> {
    if self.destroyed {
      Err(ViewError::Destroyed)
    } else {
      Ok(())
    }
  }

  pub fn dispatch(&mut self, tx: &Transaction) -> Result<(), ViewError> {
    self.ensure_live()?;
    self.state.apply(tx)?;
    Ok(())
  }

  /// Feed a key press through the read-only notice, the keymap and finally
  /// plain text insertion.
  pub fn handle_key(&mut self, event: KeyEvent) -> Result<KeyOutcome, ViewError> {
    self.ensure_live()?;

    if self.state.read_only()
      && self
        .state
        .extensions()
        .contains(&Extension::ReadOnlyTooltips)
    {
      let toggle = TooltipToggle::for_key(event.is_cancel());
      let tx = Transaction::effects_only(self.text(), [Effect::ReadOnlyTooltip(toggle)]);
      self.state.apply(&tx)?;
    }

    let keymap_enabled = self.state.extensions().contains(&Extension::Keymap);
    let handled = match self.keymap.lookup(&event).filter(|_| keymap_enabled) {
      Some(Command::Save) => {
        match &self.on_save {
          Some(on_save) => on_save(&self.state.text().to_string()),
          None => log::debug!("save requested without a save callback"),
        }
        true
      },
      Some(command) => command::execute(&mut self.state, command, self.page_lines)?,
      None => {
        match event.text() {
          Some(ch) => command::insert_char(&mut self.state, ch)?,
          None => false,
        }
      },
    };

    Ok(if handled {
      KeyOutcome::Handled
    } else {
      KeyOutcome::Continue
    })
  }

  pub fn open_completion(&mut self, items: Vec<CompletionItem>) -> Result<(), ViewError> {
    let tx = Transaction::effects_only(self.text(), [Effect::OpenCompletion(items)]);
    self.dispatch(&tx)
  }

  pub fn set_search_query(&mut self, query: Option<String>) -> Result<(), ViewError> {
    let tx = Transaction::effects_only(self.text(), [Effect::SetSearchQuery(query)]);
    self.dispatch(&tx)
  }

  /// Lines moved by page up/down.
  pub fn set_page_lines(&mut self, lines: usize) {
    self.page_lines = lines.max(1);
  }

  pub fn scroll_offset(&self) -> ScrollOffset {
    self.scroll
  }

  /// Ask the host to scroll to `offset`. Returns false when already there.
  pub fn scroll_to(&mut self, offset: ScrollOffset) -> bool {
    if self.scroll == offset {
      self.pending_scroll = None;
      return false;
    }
    self.pending_scroll = Some(offset);
    true
  }

  /// The scroll the host still has to apply.
  pub fn pending_scroll(&self) -> Option<ScrollOffset> {
    self.pending_scroll
  }

  pub fn take_scroll_request(&mut self) -> Option<ScrollOffset> {
    self.pending_scroll.take()
  }

  /// Apply the pending scroll request immediately, as a host without layout
  /// would. Returns the offset that was applied.
  pub fn settle_scroll(&mut self) -> Option<ScrollOffset> {
    let offset = self.take_scroll_request()?;
    self.notify_scroll(ScrollEvent::scroller(offset));
    Some(offset)
  }

  /// A receiver that resolves on the next scroll of the view's own scroller.
  pub fn once_scroll(&mut self) -> oneshot::Receiver<ScrollOffset> {
    let (tx, rx) = oneshot::channel();
    if !self.destroyed {
      self.scroll_listeners.retain(|listener| !listener.is_closed());
      self.scroll_listeners.push(tx);
    }
    rx
  }

  /// Drop the pending scroll request and every scroll listener.
  pub fn cancel_scroll_request(&mut self) {
    self.pending_scroll = None;
    self.scroll_listeners.clear();
  }

  pub fn scroll_listener_count(&self) -> usize {
    self.scroll_listeners.len()
  }

  /// Scroll event raised by the host.
  pub fn notify_scroll(&mut self, event: ScrollEvent) {
    if self.destroyed {
      return;
    }
    if event.is_from_scroller() {
      self.scroll = event.offset;
      if self.pending_scroll == Some(event.offset) {
        self.pending_scroll = None;
      }
      for listener in self.scroll_listeners.drain(..) {
        let _ = listener.send(event.offset);
      }
    }
    if let Some(reporter) = &self.scroll_reporter {
      reporter.push(event);
    }
  }

  pub fn focus(&mut self) {
    if self.destroyed {
      return;
    }
    if !self.focused {
      log::debug!("view in `{}` focused", self.container.name());
    }
    self.focused = true;
  }

  pub fn blur(&mut self) {
    self.focused = false;
  }

  pub fn has_focus(&self) -> bool {
    self.focused
  }

  /// Detach from the container and drop every listener. Idempotent.
  pub fn destroy(&mut self) {
    if self.destroyed {
      return;
    }
    self.destroyed = true;
    self.focused = false;
    self.pending_scroll = None;
    self.scroll_listeners.clear();
    self.scroll_reporter = None;
    self.container.detach();
    log::debug!("view in `{}` destroyed", self.container.name());
  }
}

impl fmt::Debug for View {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("View")
      .field("container", &self.container)
      .field("state", &self.state)
      .field("scroll", &self.scroll)
      .field("pending_scroll", &self.pending_scroll)
      .field("focused", &self.focused)
      .field("destroyed", &self.destroyed)
      .finish_non_exhaustive()
  }
}

/// Owning handle to a mounted view.
#[derive(Debug)]
pub struct ViewHandle(Arc<Mutex<View>>);

impl ViewHandle {
  pub(crate) fn new(view: View) -> Self {
    Self(Arc::new(Mutex::new(view)))
  }

  pub fn lock(&self) -> MutexGuard<'_, View> {
    self.0.lock()
  }

  pub fn downgrade(&self) -> WeakViewHandle {
    WeakViewHandle(Arc::downgrade(&self.0))
  }
}

/// Non-owning reference to a view, valid between mount and unmount.
#[derive(Debug, Clone)]
pub struct WeakViewHandle(Weak<Mutex<View>>);

impl WeakViewHandle {
  pub fn is_live(&self) -> bool {
    self
      .0
      .upgrade()
      .is_some_and(|view| !view.lock().is_destroyed())
  }

  /// Run `f` against the view, failing once it is gone.
  pub fn with<R>(&self, f: impl FnOnce(&mut View) -> R) -> Result<R, ViewError> {
    let view = self.0.upgrade().ok_or(ViewError::Destroyed)?;
    let mut view = view.lock();
    if view.is_destroyed() {
      return Err(ViewError::Destroyed);
    }
    Ok(f(&mut view))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{
    AtomicUsize,
    Ordering,
  };

  use the_lib::{
    extension::{
      ExtensionSet,
      base_extensions,
    },
    input::{
      Key,
      Modifiers,
    },
  };

  use super::*;

  fn view(editable: bool, on_save: Option<SaveCallback>) -> View {
    let extensions = ExtensionSet::resolve(base_extensions(2).into_iter().chain([
      Extension::EditableSlot(editable),
      Extension::ReadOnlyTooltips,
    ]));
    let container = Container::new("test");
    View::new(container, EditorState::new("abc", extensions), on_save, None)
  }

  #[test]
  fn save_key_calls_back_and_is_handled() {
    let saves = Arc::new(AtomicUsize::new(0));
    let counter = saves.clone();
    let mut view = view(
      true,
      Some(Arc::new(move |text: &str| {
        assert_eq!(text, "abc");
        counter.fetch_add(1, Ordering::SeqCst);
      })),
    );

    let outcome = view.handle_key(KeyEvent::ctrl(Key::Char('s'))).unwrap();
    assert!(outcome.is_handled());
    let meta = KeyEvent::new(Key::Char('s'), Modifiers::from_bits(Modifiers::META));
    assert!(view.handle_key(meta).unwrap().is_handled());
    assert_eq!(saves.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn read_only_keys_toggle_tooltips() {
    let mut view = view(false, None);
    view.handle_key(KeyEvent::char('x')).unwrap();
    assert_eq!(*view.text(), "abc");
    assert_eq!(view.state().tooltips().len(), 1);

    view.handle_key(KeyEvent::plain(Key::Escape)).unwrap();
    assert!(view.state().tooltips().is_empty());
  }

  #[test]
  fn shift_tab_is_reserved_no_op() {
    let mut view = view(true, None);
    let event = KeyEvent::new(Key::Tab, Modifiers::from_bits(Modifiers::SHIFT));
    assert!(view.handle_key(event).unwrap().is_handled());
    assert_eq!(*view.text(), "abc");
  }

  #[test]
  fn scroll_listener_fires_once_on_scroller_events() {
    let mut view = view(true, None);
    let mut signal = view.once_scroll();
    assert!(view.scroll_to(ScrollOffset::new(50, 0)));

    view.notify_scroll(ScrollEvent::nested(ScrollOffset::new(10, 0)));
    assert!(signal.try_recv().is_err());
    assert_eq!(view.scroll_offset(), ScrollOffset::ORIGIN);

    assert_eq!(view.settle_scroll(), Some(ScrollOffset::new(50, 0)));
    assert_eq!(signal.try_recv().unwrap(), ScrollOffset::new(50, 0));
    assert_eq!(view.pending_scroll(), None);
    assert!(!view.scroll_to(ScrollOffset::new(50, 0)));
  }

  #[test]
  fn abandoned_scroll_listeners_are_pruned() {
    let mut view = view(true, None);
    drop(view.once_scroll());
    drop(view.once_scroll());
    let mut live = view.once_scroll();
    assert_eq!(view.scroll_listener_count(), 1);

    assert!(view.scroll_to(ScrollOffset::new(9, 0)));
    view.cancel_scroll_request();
    assert_eq!(view.pending_scroll(), None);
    assert_eq!(view.scroll_listener_count(), 0);
    assert!(matches!(
      live.try_recv(),
      Err(oneshot::error::TryRecvError::Closed)
    ));
  }

  #[test]
  fn destroyed_view_rejects_work() {
    let mut view = view(true, None);
    view.container().attach().unwrap();
    let mut signal = view.once_scroll();
    view.focus();
    view.destroy();

    assert!(!view.has_focus());
    assert!(!view.container().is_mounted());
    assert!(signal.try_recv().is_err());
    assert!(matches!(
      view.handle_key(KeyEvent::char('x')),
      Err(ViewError::Destroyed)
    ));
    view.focus();
    assert!(!view.has_focus());
  }

  #[test]
  fn weak_handle_stops_after_drop() {
    let handle = ViewHandle::new(view(true, None));
    let weak = handle.downgrade();
    assert_eq!(weak.with(|view| view.text().len_chars()).unwrap(), 3);
    drop(handle);
    assert!(!weak.is_live());
    assert!(matches!(weak.with(|_| ()), Err(ViewError::Destroyed)));
  }
}
