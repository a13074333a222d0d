//! The editor session: one container, one view, one document at a time.

use std::sync::Arc;

use the_lib::{
  config::SessionConfig,
  document::Document,
  extension::LanguageSlot,
  input::{
    KeyEvent,
    KeyOutcome,
  },
  view::ScrollEvent,
};
use thiserror::Error;

use crate::{
  container::Container,
  factory::ViewCallbacks,
  language::LanguageLoader,
  lifecycle::LifecycleOwner,
  sync::{
    DocumentSynchronizer,
    SyncTicket,
  },
  view::{
    ViewError,
    WeakViewHandle,
  },
};

#[derive(Debug, Error)]
pub enum SessionError {
  #[error(transparent)]
  View(#[from] ViewError),
  #[error("session is not mounted")]
  NotMounted,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Inputs supplied by the host on every update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProps {
  pub document:   Document,
  pub editable:   bool,
  pub auto_focus: bool,
}

impl SessionProps {
  pub fn new(document: Document) -> Self {
    Self {
      document,
      editable: true,
      auto_focus: false,
    }
  }

  pub fn editable(mut self, editable: bool) -> Self {
    self.editable = editable;
    self
  }

  pub fn auto_focus(mut self, auto_focus: bool) -> Self {
    self.auto_focus = auto_focus;
    self
  }
}

pub struct Session {
  owner:        LifecycleOwner,
  config:       SessionConfig,
  callbacks:    ViewCallbacks,
  synchronizer: DocumentSynchronizer,
  language:     LanguageSlot,
}

impl Session {
  pub fn new(
    container: Container,
    config: SessionConfig,
    callbacks: ViewCallbacks,
    loader: Arc<dyn LanguageLoader>,
  ) -> Self {
    Self {
      owner: LifecycleOwner::new(container),
      config,
      callbacks,
      synchronizer: DocumentSynchronizer::new(loader),
      language: LanguageSlot::new(),
    }
  }

  pub fn config(&self) -> &SessionConfig {
    &self.config
  }

  pub fn language_slot(&self) -> LanguageSlot {
    self.language
  }

  /// Create the view. The language slot starts out empty.
  pub fn mount(&mut self) -> Result<WeakViewHandle> {
    let view = self.owner.mount(&self.config, self.callbacks.clone(), [
      self.language.of(None),
    ])?;
    Ok(view)
  }

  pub fn is_mounted(&self) -> bool {
    self.owner.is_mounted()
  }

  pub fn view(&self) -> Option<WeakViewHandle> {
    self.owner.view()
  }

  /// Reconcile `props` into the view. Text and editability are updated before
  /// this returns; the ticket tracks the rest.
  pub fn update(&mut self, props: &SessionProps) -> Result<SyncTicket> {
    let view = self.owner.view().ok_or(SessionError::NotMounted)?;
    self.synchronizer.sync(
      &view,
      props.editable,
      &self.language,
      props.auto_focus,
      &props.document,
    )
  }

  pub fn handle_key(&self, event: KeyEvent) -> Result<KeyOutcome> {
    let view = self.owner.view().ok_or(SessionError::NotMounted)?;
    Ok(view.with(|view| view.handle_key(event))??)
  }

  pub fn notify_scroll(&self, event: ScrollEvent) -> Result<()> {
    let view = self.owner.view().ok_or(SessionError::NotMounted)?;
    view.with(|view| view.notify_scroll(event))?;
    Ok(())
  }

  /// Cancel the in-flight pass and destroy the view.
  pub fn unmount(&mut self) -> bool {
    self.synchronizer.cancel();
    self.owner.unmount()
  }
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Session")
      .field("owner", &self.owner)
      .field("config", &self.config)
      .field("synchronizer", &self.synchronizer)
      .field("language", &self.language)
      .finish_non_exhaustive()
  }
}
