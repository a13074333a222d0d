//! Changes to the buffer, bundled with selection updates and effects.
//!
//! A [`ChangeSet`] is a sequence of [`Operation`]s applied from the start of
//! the buffer:
//!
//! - **Retain(n)** keeps `n` characters
//! - **Delete(n)** removes `n` characters
//! - **Insert(s)** inserts `s`
//!
//! A [`Transaction`] is the unit dispatched into the editor state: an optional
//! change set, an optional explicit selection, and zero or more tagged
//! [`Effect`]s that state fields interpret in dispatch order.
//!
//! ```ignore
//! use ropey::Rope;
//! use the_lib::transaction::Transaction;
//!
//! let mut doc = Rope::from("hello world");
//! let tx = Transaction::change(&doc, vec![(6, 11, Some("rust".into()))]).unwrap();
//! tx.apply(&mut doc).unwrap();
//! assert_eq!(doc.to_string(), "hello rust");
//! ```

use std::borrow::Cow;

use ropey::{
  Rope,
  RopeSlice,
};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
  Tendril,
  effect::Effect,
  selection::{
    Range,
    Selection,
  },
};

pub type Result<T> = std::result::Result<T, TransactionError>;

/// (from, to) replacement.
pub type Change = (usize, usize, Option<Tendril>);

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error(
    "changeset compose length mismatch: left output {left_len_after}, right input {right_len}"
  )]
  ComposeLengthMismatch {
    left_len_after: usize,
    right_len:      usize,
  },
  #[error("invalid change range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("change range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("change range {from}..{to} overlaps previous end {prev_end}")]
  OverlappingRange {
    prev_end: usize,
    from:     usize,
    to:       usize,
  },
  #[error("position {pos} is out of bounds for changeset length {len}")]
  PositionOutOfBounds { pos: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  Retain(usize),
  Delete(usize),
  Insert(Tendril),
}

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  Before,
  After,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  changes:   Vec<Operation>,
  /// Document length the set applies to.
  len:       usize,
  len_after: usize,
}

impl ChangeSet {
  fn with_capacity(capacity: usize) -> Self {
    Self {
      changes:   Vec::with_capacity(capacity),
      len:       0,
      len_after: 0,
    }
  }

  #[must_use]
  pub fn new(doc: RopeSlice) -> Self {
    let len = doc.len_chars();
    Self {
      changes: Vec::new(),
      len,
      len_after: len,
    }
  }

  pub fn operations(&self) -> &[Operation] {
    &self.changes
  }

  /// Length of the document this set expects.
  pub fn len(&self) -> usize {
    self.len
  }

  /// Length of the document after applying this set.
  pub fn len_after(&self) -> usize {
    self.len_after
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.changes.is_empty() || self.changes == [Operation::Retain(self.len)]
  }

  fn delete(&mut self, n: usize) {
    if n == 0 {
      return;
    }
    self.len += n;
    if let Some(Operation::Delete(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Operation::Delete(n));
    }
  }

  fn insert(&mut self, fragment: Tendril) {
    if fragment.is_empty() {
      return;
    }
    self.len_after += fragment.chars().count();
    // Keep inserts ahead of deletes so a replacement reads Insert, Delete.
    let next = match self.changes.as_mut_slice() {
      [.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
        prev.push_str(&fragment);
        return;
      },
      [.., last @ Operation::Delete(_)] => std::mem::replace(last, Operation::Insert(fragment)),
      _ => Operation::Insert(fragment),
    };
    self.changes.push(next);
  }

  fn retain(&mut self, n: usize) {
    if n == 0 {
      return;
    }
    self.len += n;
    self.len_after += n;
    if let Some(Operation::Retain(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Operation::Retain(n));
    }
  }

  fn ensure_len(&self, text_len: usize) -> Result<()> {
    if text_len != self.len {
      return Err(TransactionError::LengthMismatch {
        expected: self.len,
        actual:   text_len,
      });
    }
    Ok(())
  }

  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    self.ensure_len(text.len_chars())?;
    let mut pos = 0;
    for change in &self.changes {
      match change {
        Operation::Retain(n) => pos += n,
        Operation::Delete(n) => text.remove(pos..pos + *n),
        Operation::Insert(s) => {
          text.insert(pos, s);
          pos += s.chars().count();
        },
      }
    }
    Ok(())
  }

  /// A set that reverts this one. `original` is the text before applying.
  pub fn invert(&self, original: &Rope) -> Result<Self> {
    self.ensure_len(original.len_chars())?;
    let mut inverted = Self::with_capacity(self.changes.len());
    let mut pos = 0;
    for change in &self.changes {
      match change {
        Operation::Retain(n) => {
          inverted.retain(*n);
          pos += n;
        },
        Operation::Delete(n) => {
          let removed = Cow::from(original.slice(pos..pos + *n));
          inverted.insert(Tendril::from(removed.as_ref()));
          pos += n;
        },
        Operation::Insert(s) => inverted.delete(s.chars().count()),
      }
    }
    // An untouched tail is implicit in `changes`; make it explicit.
    inverted.retain(self.len - pos);
    Ok(inverted)
  }

  /// Sequential composition: applying the result equals applying `self`
  /// then `other`.
  pub fn compose(self, other: Self) -> Result<Self> {
    use std::cmp::Ordering;

    use Operation::*;

    if self.len_after != other.len {
      return Err(TransactionError::ComposeLengthMismatch {
        left_len_after: self.len_after,
        right_len:      other.len,
      });
    }
    if self.changes.is_empty() {
      return Ok(other);
    }
    if other.changes.is_empty() {
      return Ok(self);
    }

    let len = self.len;
    let mut out = Self::with_capacity(self.changes.len() + other.changes.len());
    let mut left = self.changes.into_iter();
    let mut right = other.changes.into_iter();
    let mut a = left.next();
    let mut b = right.next();

    loop {
      match (a.take(), b.take()) {
        (None, None) => break,
        (Some(Delete(n)), rest) => {
          out.delete(n);
          a = left.next();
          b = rest;
        },
        (rest, Some(Insert(s))) => {
          out.insert(s);
          a = rest;
          b = right.next();
        },
        (Some(Retain(i)), Some(Retain(j))) => {
          out.retain(i.min(j));
          match i.cmp(&j) {
            Ordering::Less => {
              a = left.next();
              b = Some(Retain(j - i));
            },
            Ordering::Equal => {
              a = left.next();
              b = right.next();
            },
            Ordering::Greater => {
              a = Some(Retain(i - j));
              b = right.next();
            },
          }
        },
        (Some(Insert(s)), Some(Delete(j))) => {
          let n = s.chars().count();
          match n.cmp(&j) {
            Ordering::Less => {
              a = left.next();
              b = Some(Delete(j - n));
            },
            Ordering::Equal => {
              a = left.next();
              b = right.next();
            },
            Ordering::Greater => {
              a = Some(Insert(s.chars().skip(j).collect::<String>().into()));
              b = right.next();
            },
          }
        },
        (Some(Insert(s)), Some(Retain(j))) => {
          let n = s.chars().count();
          match n.cmp(&j) {
            Ordering::Less => {
              out.insert(s);
              a = left.next();
              b = Some(Retain(j - n));
            },
            Ordering::Equal => {
              out.insert(s);
              a = left.next();
              b = right.next();
            },
            Ordering::Greater => {
              out.insert(s.chars().take(j).collect::<String>().into());
              a = Some(Insert(s.chars().skip(j).collect::<String>().into()));
              b = right.next();
            },
          }
        },
        (Some(Retain(i)), Some(Delete(j))) => {
          out.delete(i.min(j));
          match i.cmp(&j) {
            Ordering::Less => {
              a = left.next();
              b = Some(Delete(j - i));
            },
            Ordering::Equal => {
              a = left.next();
              b = right.next();
            },
            Ordering::Greater => {
              a = Some(Retain(i - j));
              b = right.next();
            },
          }
        },
        (None, Some(op)) | (Some(op), None) => {
          unreachable!("changeset lengths validated, dangling {op:?}")
        },
      }
    }

    debug_assert_eq!(out.len, len);
    Ok(out)
  }

  /// Map a position in the old document to the new one.
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    if pos > self.len {
      return Err(TransactionError::PositionOutOfBounds { pos, len: self.len });
    }

    let mut old_pos = 0;
    let mut new_pos = 0;
    let mut iter = self.changes.iter().peekable();
    while let Some(change) = iter.next() {
      match change {
        Operation::Retain(n) => {
          if pos < old_pos + n {
            return Ok(new_pos + (pos - old_pos));
          }
          old_pos += n;
          new_pos += n;
        },
        Operation::Delete(n) => {
          if pos < old_pos + n {
            return Ok(new_pos);
          }
          old_pos += n;
        },
        Operation::Insert(s) => {
          let inserted = s.chars().count();
          // Insert followed by Delete is a replacement of that range.
          let replaced = match iter.peek() {
            Some(Operation::Delete(n)) => {
              let n = *n;
              iter.next();
              n
            },
            _ => 0,
          };
          let inside = if replaced == 0 {
            pos == old_pos
          } else {
            pos < old_pos + replaced
          };
          if inside {
            return Ok(match assoc {
              Assoc::Before if pos == old_pos => new_pos,
              Assoc::Before | Assoc::After => new_pos + inserted,
            });
          }
          old_pos += replaced;
          new_pos += inserted;
        },
      }
    }
    Ok(new_pos + (pos - old_pos))
  }
}

fn validate_change_bounds(from: usize, to: usize, len: usize) -> Result<()> {
  if from > to {
    return Err(TransactionError::InvalidRange { from, to });
  }
  if to > len {
    return Err(TransactionError::RangeOutOfBounds { from, to, len });
  }
  Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
  changes:        ChangeSet,
  selection:      Option<Selection>,
  effects:        SmallVec<[Effect; 2]>,
  add_to_history: bool,
}

impl From<ChangeSet> for Transaction {
  fn from(changes: ChangeSet) -> Self {
    Self {
      changes,
      selection: None,
      effects: SmallVec::new(),
      add_to_history: true,
    }
  }
}

impl Transaction {
  /// A transaction that leaves `doc` untouched.
  pub fn new(doc: &Rope) -> Self {
    Self::from(ChangeSet::new(doc.slice(..)))
  }

  /// A transaction carrying only effects.
  pub fn effects_only(doc: &Rope, effects: impl IntoIterator<Item = Effect>) -> Self {
    let mut tx = Self::new(doc);
    tx.effects.extend(effects);
    tx
  }

  pub fn changes(&self) -> &ChangeSet {
    &self.changes
  }

  pub fn selection(&self) -> Option<&Selection> {
    self.selection.as_ref()
  }

  pub fn effects(&self) -> &[Effect] {
    &self.effects
  }

  pub fn add_to_history(&self) -> bool {
    self.add_to_history
  }

  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    self.changes.apply(doc)
  }

  pub fn invert(&self, original: &Rope) -> Result<Self> {
    Ok(Self::from(self.changes.invert(original)?))
  }

  pub fn compose(mut self, other: Self) -> Result<Self> {
    self.changes = self.changes.compose(other.changes)?;
    self.selection = other.selection;
    self.effects.extend(other.effects);
    Ok(self)
  }

  pub fn with_selection(mut self, selection: Selection) -> Self {
    self.selection = Some(selection);
    self
  }

  pub fn with_effect(mut self, effect: Effect) -> Self {
    self.effects.push(effect);
    self
  }

  pub fn without_history(mut self) -> Self {
    self.add_to_history = false;
    self
  }

  /// Build from sorted, non-overlapping changes.
  pub fn change<I>(doc: &Rope, changes: I) -> Result<Self>
  where
    I: IntoIterator<Item = Change>,
  {
    let len = doc.len_chars();
    let changes = changes.into_iter();
    let mut changeset = ChangeSet::with_capacity(2 * changes.size_hint().0 + 1);

    let mut last = 0;
    for (from, to, text) in changes {
      validate_change_bounds(from, to, len)?;
      if from < last {
        return Err(TransactionError::OverlappingRange {
          prev_end: last,
          from,
          to,
        });
      }
      changeset.retain(from - last);
      if let Some(text) = text {
        changeset.insert(text);
      }
      changeset.delete(to - from);
      last = to;
    }
    changeset.retain(len - last);

    Ok(Self::from(changeset))
  }

  /// Replace the whole document with `text` in one edit, caret at 0.
  pub fn replace_all(doc: &Rope, text: &str) -> Result<Self> {
    Ok(
      Self::change(doc, [(0, doc.len_chars(), Some(Tendril::from(text)))])?
        .with_selection(Selection::point(0)),
    )
  }

  /// One change per selection range.
  pub fn change_by_selection<F>(doc: &Rope, selection: &Selection, f: F) -> Result<Self>
  where
    F: FnMut(&Range) -> Change,
  {
    Self::change(doc, selection.iter().map(f))
  }
}
