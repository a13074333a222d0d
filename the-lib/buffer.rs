//! Text buffer with selection and undo history.
//!
//! The buffer applies [`Transaction`]s and groups their changes into history
//! revisions on [`Buffer::commit`]. It does not know about editability;
//! callers decide which edits are allowed before they reach it.

use ropey::Rope;
use thiserror::Error;

use crate::{
  history::{
    History,
    HistoryError,
    HistoryJump,
    State,
  },
  selection::{
    Selection,
    SelectionError,
  },
  transaction::{
    ChangeSet,
    Transaction,
    TransactionError,
  },
};

#[derive(Debug, Error)]
pub enum BufferError {
  #[error(transparent)]
  Transaction(#[from] TransactionError),
  #[error(transparent)]
  Selection(#[from] SelectionError),
  #[error(transparent)]
  History(#[from] HistoryError),
}

pub type Result<T> = std::result::Result<T, BufferError>;

#[derive(Debug)]
pub struct Buffer {
  text:      Rope,
  selection: Selection,
  history:   History,
  changes:   ChangeSet,
  old_state: Option<State>,
  version:   u64,
  modified:  bool,
}

impl Default for Buffer {
  fn default() -> Self {
    Self::new(Rope::new())
  }
}

impl Buffer {
  pub fn new(text: Rope) -> Self {
    let changes = ChangeSet::new(text.slice(..));
    Self {
      text,
      selection: Selection::point(0),
      history: History::default(),
      changes,
      old_state: None,
      version: 0,
      modified: false,
    }
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  /// Whether the buffer holds exactly `value`, without allocating.
  pub fn text_eq(&self, value: &str) -> bool {
    self.text.len_bytes() == value.len() && self.text == value
  }

  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  pub fn version(&self) -> u64 {
    self.version
  }

  pub fn is_modified(&self) -> bool {
    self.modified
  }

  pub fn apply(&mut self, transaction: &Transaction) -> Result<()> {
    let changed = !transaction.changes().is_empty();
    if changed && self.old_state.is_none() {
      self.old_state = Some(State {
        doc:       self.text.clone(),
        selection: self.selection.clone(),
      });
    }

    transaction.apply(&mut self.text)?;

    let len = self.text.len_chars();
    self.selection = match transaction.selection() {
      Some(selection) => selection.clone().transform(|range| range.clamp(len)),
      None => self.selection.clone().map(transaction.changes())?,
    };

    if changed {
      let prior = std::mem::take(&mut self.changes);
      self.changes = prior.compose(transaction.changes().clone())?;
      self.modified = true;
      self.version = self.version.saturating_add(1);
    }
    Ok(())
  }

  /// Turn pending changes into one history revision.
  pub fn commit(&mut self) -> Result<()> {
    let Some(original) = self.old_state.take() else {
      return Ok(());
    };
    if self.changes.is_empty() {
      return Ok(());
    }

    let tx = Transaction::from(self.changes.clone()).with_selection(self.selection.clone());
    self.history.commit_revision(&tx, &original)?;
    self.changes = ChangeSet::new(self.text.slice(..));
    Ok(())
  }

  /// Drop pending changes without recording them.
  pub fn forget(&mut self) {
    self.old_state = None;
    self.changes = ChangeSet::new(self.text.slice(..));
  }

  /// Drop pending changes and every recorded revision.
  pub fn clear_history(&mut self) {
    self.forget();
    self.history = History::default();
  }

  pub fn undo(&mut self) -> Result<bool> {
    self.commit()?;
    let Some(jump) = self.history.undo() else {
      return Ok(false);
    };
    self.apply_jump(&jump)?;
    Ok(true)
  }

  pub fn redo(&mut self) -> Result<bool> {
    self.commit()?;
    let Some(jump) = self.history.redo() else {
      return Ok(false);
    };
    self.apply_jump(&jump)?;
    Ok(true)
  }

  fn apply_jump(&mut self, jump: &HistoryJump) -> Result<()> {
    jump.transaction.apply(&mut self.text)?;
    self.selection = match jump.transaction.selection() {
      Some(selection) => selection.clone(),
      None => self.selection.clone().map(jump.transaction.changes())?,
    };
    self.history.apply_jump(jump)?;
    self.changes = ChangeSet::new(self.text.slice(..));
    self.version = self.version.saturating_add(1);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn apply_and_commit_transaction() {
    let mut buffer = Buffer::new(Rope::from("hello"));
    let tx = Transaction::change(buffer.text(), vec![(5, 5, Some(" world".into()))]).unwrap();
    buffer.apply(&tx).unwrap();
    buffer.commit().unwrap();

    assert_eq!(*buffer.text(), "hello world");
    assert_eq!(buffer.history().len(), 2);
    assert!(buffer.is_modified());
  }

  #[test]
  fn undo_redo_roundtrip() {
    let mut buffer = Buffer::new(Rope::from("hello"));
    let tx = Transaction::change(buffer.text(), vec![(5, 5, Some("!".into()))]).unwrap();
    buffer.apply(&tx).unwrap();

    assert!(buffer.undo().unwrap());
    assert_eq!(*buffer.text(), "hello");
    assert!(buffer.redo().unwrap());
    assert_eq!(*buffer.text(), "hello!");
    assert!(!buffer.redo().unwrap());
  }

  #[test]
  fn selection_only_transaction_leaves_history_alone() {
    let mut buffer = Buffer::new(Rope::from("abc"));
    let tx = Transaction::new(buffer.text()).with_selection(Selection::point(2));
    buffer.apply(&tx).unwrap();
    buffer.commit().unwrap();

    assert_eq!(buffer.selection().primary().head, 2);
    assert_eq!(buffer.history().len(), 1);
    assert_eq!(buffer.version(), 0);
  }

  #[test]
  fn explicit_selection_is_clamped() {
    let mut buffer = Buffer::new(Rope::from("abc"));
    let tx = Transaction::change(buffer.text(), vec![(0, 3, None)])
      .unwrap()
      .with_selection(Selection::point(3));
    buffer.apply(&tx).unwrap();
    assert_eq!(buffer.selection().primary().head, 0);
  }

  #[test]
  fn text_eq_compares_contents() {
    let buffer = Buffer::new(Rope::from("a\nb"));
    assert!(buffer.text_eq("a\nb"));
    assert!(!buffer.text_eq("a\nc"));
    assert!(!buffer.text_eq("a\nbb"));
  }
}
