//! Undo history for a single buffer.
//!
//! Revisions form a tree stored in a vector. Index 0 is an empty root. Every
//! other revision records its parent, the transaction that leads from the
//! parent to it, and the inversion leading back. Undo walks to the parent,
//! redo follows the most recently created child.

use std::{
  num::NonZeroUsize,
  time::Instant,
};

use ropey::Rope;
use thiserror::Error;

use crate::{
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

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Error)]
pub enum HistoryError {
  #[error("transaction error: {0}")]
  Transaction(#[from] TransactionError),
  #[error("selection error: {0}")]
  Selection(#[from] SelectionError),
  #[error("revision index {index} is out of bounds (max: {max})")]
  RevisionOutOfBounds { index: usize, max: usize },
}

/// Buffer contents and selection before a group of edits.
#[derive(Debug, Clone)]
pub struct State {
  pub doc:       Rope,
  pub selection: Selection,
}

/// A prepared move through history. Apply `transaction` to the buffer first,
/// then hand the jump back to [`History::apply_jump`].
#[derive(Debug, Clone)]
pub struct HistoryJump {
  pub transaction: Transaction,
  pub target:      usize,
}

#[derive(Debug)]
pub struct History {
  revisions: Vec<Revision>,
  current:   usize,
}

#[derive(Debug, Clone)]
struct Revision {
  parent:      usize,
  last_child:  Option<NonZeroUsize>,
  transaction: Transaction,
  inversion:   Transaction,
  timestamp:   Instant,
}

impl Default for History {
  fn default() -> Self {
    let empty = Transaction::from(ChangeSet::new("".into()));
    Self {
      revisions: vec![Revision {
        parent:      0,
        last_child:  None,
        transaction: empty.clone(),
        inversion:   empty,
        timestamp:   Instant::now(),
      }],
      current:   0,
    }
  }
}

impl History {
  pub fn commit_revision(&mut self, transaction: &Transaction, original: &State) -> Result<()> {
    let selection_after = match transaction.selection() {
      Some(selection) => selection.clone(),
      None => original.selection.clone().map(transaction.changes())?,
    };
    let inversion = transaction
      .invert(&original.doc)?
      .with_selection(original.selection.clone());

    let new_current = self.revisions.len();
    self.revisions[self.current].last_child = NonZeroUsize::new(new_current);
    self.revisions.push(Revision {
      parent: self.current,
      last_child: None,
      transaction: Transaction::from(transaction.changes().clone()).with_selection(selection_after),
      inversion,
      timestamp: Instant::now(),
    });
    self.current = new_current;
    tracing::trace!(revision = new_current, "history revision committed");
    Ok(())
  }

  #[inline]
  pub fn current_revision(&self) -> usize {
    self.current
  }

  #[inline]
  pub const fn at_root(&self) -> bool {
    self.current == 0
  }

  /// Number of revisions, root included.
  #[inline]
  pub fn len(&self) -> usize {
    self.revisions.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.revisions.len() <= 1
  }

  pub fn revision_timestamp(&self, revision: usize) -> Result<Instant> {
    self
      .revisions
      .get(revision)
      .map(|revision| revision.timestamp)
      .ok_or(HistoryError::RevisionOutOfBounds {
        index: revision,
        max:   self.revisions.len() - 1,
      })
  }

  pub fn undo(&self) -> Option<HistoryJump> {
    if self.at_root() {
      return None;
    }
    let current = &self.revisions[self.current];
    Some(HistoryJump {
      transaction: current.inversion.clone(),
      target:      current.parent,
    })
  }

  pub fn redo(&self) -> Option<HistoryJump> {
    let child = self.revisions[self.current].last_child?;
    Some(HistoryJump {
      transaction: self.revisions[child.get()].transaction.clone(),
      target:      child.get(),
    })
  }

  pub fn apply_jump(&mut self, jump: &HistoryJump) -> Result<()> {
    if jump.target >= self.revisions.len() {
      return Err(HistoryError::RevisionOutOfBounds {
        index: jump.target,
        max:   self.revisions.len() - 1,
      });
    }
    self.current = jump.target;
    Ok(())
  }
}
