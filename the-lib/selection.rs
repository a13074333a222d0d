//! Cursor positions and multi-range selections.
//!
//! A [`Range`] has an `anchor` and a `head`; the head is where the caret is
//! drawn. When both are equal the range is an empty caret. A [`Selection`]
//! holds one or more ranges, kept sorted with overlaps merged, plus the index
//! of the primary range.
//!
//! ```text
//! anchor=2, head=7: "he[llo w]orld"  (forward selection)
//! anchor=7, head=2: "he]llo w[orld"  (backward selection)
//! anchor=5, head=5: "hello|world"    (caret)
//! ```

use smallvec::{
  SmallVec,
  smallvec,
};
use thiserror::Error;

use crate::transaction::{
  Assoc,
  ChangeSet,
  TransactionError,
};

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
  #[error("selection must contain at least one range")]
  EmptySelection,
  #[error("primary index {index} out of bounds for selection of length {len}")]
  PrimaryOutOfBounds { index: usize, len: usize },
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
  pub anchor: usize,
  pub head:   usize,
}

impl Range {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  #[inline]
  pub fn point(head: usize) -> Self {
    Self::new(head, head)
  }

  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    self.anchor.min(self.head)
  }

  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    self.anchor.max(self.head)
  }

  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.to() - self.from()
  }

  /// A caret: head and anchor coincide.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.anchor == self.head
  }

  #[inline]
  pub fn overlaps(&self, other: &Self) -> bool {
    // Two carets at the same spot also overlap.
    self.from() == other.from() || (self.to() > other.from() && other.to() > self.from())
  }

  /// Map through `changes`. Carets follow insertions at their position.
  pub fn map(self, changes: &ChangeSet) -> Result<Self> {
    if changes.is_empty() {
      return Ok(self);
    }
    if self.is_empty() {
      let pos = changes.map_pos(self.head, Assoc::After)?;
      return Ok(Self::point(pos));
    }
    let (from_assoc, to_assoc) = (Assoc::After, Assoc::Before);
    let from = changes.map_pos(self.from(), from_assoc)?;
    let to = changes.map_pos(self.to(), to_assoc)?.max(from);
    Ok(if self.anchor <= self.head {
      Self::new(from, to)
    } else {
      Self::new(to, from)
    })
  }

  pub fn merge(&self, other: Self) -> Self {
    let from = self.from().min(other.from());
    let to = self.to().max(other.to());
    if self.anchor > self.head && other.anchor > other.head {
      Self::new(to, from)
    } else {
      Self::new(from, to)
    }
  }

  /// Clamp both ends to `len`.
  pub fn clamp(self, len: usize) -> Self {
    Self::new(self.anchor.min(len), self.head.min(len))
  }
}

/// One or more ranges. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
  ranges:  SmallVec<[Range; 1]>,
  primary: usize,
}

impl Selection {
  pub fn new(ranges: SmallVec<[Range; 1]>, primary: usize) -> Result<Self> {
    if ranges.is_empty() {
      return Err(SelectionError::EmptySelection);
    }
    if primary >= ranges.len() {
      return Err(SelectionError::PrimaryOutOfBounds {
        index: primary,
        len:   ranges.len(),
      });
    }
    Ok(Self { ranges, primary }.normalize())
  }

  pub fn point(pos: usize) -> Self {
    Self::single(pos, pos)
  }

  pub fn single(anchor: usize, head: usize) -> Self {
    Self {
      ranges:  smallvec![Range::new(anchor, head)],
      primary: 0,
    }
  }

  pub fn ranges(&self) -> &[Range] {
    &self.ranges
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Range> {
    self.ranges.iter()
  }

  pub fn primary(&self) -> Range {
    self.ranges[self.primary]
  }

  pub fn primary_index(&self) -> usize {
    self.primary
  }

  pub fn len(&self) -> usize {
    self.ranges.len()
  }

  /// Head positions of all empty ranges.
  pub fn carets(&self) -> impl Iterator<Item = usize> + '_ {
    self
      .ranges
      .iter()
      .filter(|range| range.is_empty())
      .map(|range| range.head)
  }

  pub fn map(self, changes: &ChangeSet) -> Result<Self> {
    let primary = self.primary;
    let ranges = self
      .ranges
      .into_iter()
      .map(|range| range.map(changes))
      .collect::<Result<SmallVec<[Range; 1]>>>()?;
    Ok(Self { ranges, primary }.normalize())
  }

  /// Apply `f` to every range.
  pub fn transform<F>(mut self, mut f: F) -> Self
  where
    F: FnMut(Range) -> Range,
  {
    for range in self.ranges.iter_mut() {
      *range = f(*range);
    }
    self.normalize()
  }

  /// Sort by start and merge overlapping ranges, tracking the primary.
  fn normalize(mut self) -> Self {
    if self.ranges.len() < 2 {
      return self;
    }
    let primary = self.ranges[self.primary];
    self.ranges.sort_by_key(Range::from);

    let mut merged: SmallVec<[Range; 1]> = SmallVec::with_capacity(self.ranges.len());
    let mut primary_index = 0;
    for range in self.ranges {
      match merged.last_mut() {
        Some(prev) if prev.overlaps(&range) => *prev = prev.merge(range),
        _ => merged.push(range),
      }
      if range == primary {
        primary_index = merged.len() - 1;
      }
    }

    Self {
      ranges:  merged,
      primary: primary_index,
    }
  }
}

#[cfg(test)]
mod tests {
  use ropey::Rope;

  use super::*;
  use crate::transaction::Transaction;

  #[test]
  fn normalize_merges_overlaps_and_keeps_primary() {
    let selection = Selection::new(
      smallvec![Range::new(10, 12), Range::new(0, 3), Range::new(2, 5)],
      0,
    )
    .unwrap();
    assert_eq!(selection.ranges(), &[Range::new(0, 5), Range::new(10, 12)]);
    assert_eq!(selection.primary(), Range::new(10, 12));
  }

  #[test]
  fn empty_selection_is_rejected() {
    assert_eq!(
      Selection::new(SmallVec::new(), 0).unwrap_err(),
      SelectionError::EmptySelection
    );
  }

  #[test]
  fn carets_skip_non_empty_ranges() {
    let selection = Selection::new(
      smallvec![Range::point(1), Range::new(3, 6), Range::point(8)],
      0,
    )
    .unwrap();
    assert_eq!(selection.carets().collect::<Vec<_>>(), vec![1, 8]);
  }

  #[test]
  fn caret_follows_insert_at_its_position() {
    let doc = Rope::from("abc");
    let tx = Transaction::change(&doc, vec![(1, 1, Some("xy".into()))]).unwrap();
    let mapped = Selection::point(1).map(tx.changes()).unwrap();
    assert_eq!(mapped.primary(), Range::point(3));
  }

  #[test]
  fn selection_shrinks_over_deletion() {
    let doc = Rope::from("hello world");
    let tx = Transaction::change(&doc, vec![(0, 6, None)]).unwrap();
    let mapped = Selection::single(4, 9).map(tx.changes()).unwrap();
    assert_eq!(mapped.primary(), Range::new(0, 3));
  }
}
