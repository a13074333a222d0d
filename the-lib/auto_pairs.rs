//! Automatic bracket and quote pairing.
//!
//! Typing an opening character at a caret inserts the whole pair with the
//! caret between them, as long as the next character is not alphanumeric
//! (and, for quotes, the previous one isn't either, so `don't` stays alone).
//! Typing a closing character in front of the same character moves over it
//! instead of inserting a duplicate: `(|)` → type `)` → `()|`.
//!
//! Backspace between an empty pair deletes both halves.

use ropey::{
  Rope,
  RopeSlice,
};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
  Tendril,
  selection::{
    Range,
    Selection,
    SelectionError,
  },
  transaction::{
    Change,
    Transaction,
    TransactionError,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
  pub open:  char,
  pub close: char,
}

/// The pairs active for the current language binding.
#[derive(Debug, Clone)]
pub struct AutoPairs(Vec<Pair>);

pub type Result<T> = std::result::Result<T, AutoPairsError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AutoPairsError {
  #[error(transparent)]
  Selection(#[from] SelectionError),
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

impl Pair {
  /// true if open == close
  pub fn same(&self) -> bool {
    self.open == self.close
  }

  fn should_close(&self, doc: RopeSlice, cursor: usize) -> bool {
    let next_is_not_alpha = doc.get_char(cursor).is_none_or(|c| !c.is_alphanumeric());
    let prev_is_not_alpha = prev_char(doc, cursor).is_none_or(|c| !c.is_alphanumeric());
    next_is_not_alpha && (!self.same() || prev_is_not_alpha)
  }
}

impl From<&(char, char)> for Pair {
  fn from(&(open, close): &(char, char)) -> Self {
    Self { open, close }
  }
}

impl AutoPairs {
  pub fn new(pairs: &[(char, char)]) -> Self {
    Self(pairs.iter().map(Pair::from).collect())
  }

  pub fn pairs(&self) -> &[Pair] {
    &self.0
  }

  pub fn matches_char(&self, ch: char) -> bool {
    self.0.iter().any(|pair| pair.open == ch || pair.close == ch)
  }
}

impl Default for AutoPairs {
  fn default() -> Self {
    AutoPairs::new(crate::syntax::DEFAULT_BRACKETS)
  }
}

fn prev_char(doc: RopeSlice, pos: usize) -> Option<char> {
  pos.checked_sub(1).and_then(|pos| doc.get_char(pos))
}

fn char_tendril(chars: &[char]) -> Tendril {
  let mut text = Tendril::new();
  for ch in chars {
    text.push(*ch);
  }
  text
}

/// Insert hook for a typed character. `None` when `ch` is not part of any
/// pair and the default insertion applies.
pub fn hook(
  doc: &Rope,
  selection: &Selection,
  ch: char,
  pairs: &AutoPairs,
) -> Result<Option<Transaction>> {
  if !pairs.matches_char(ch) {
    return Ok(None);
  }

  let slice = doc.slice(..);
  let mut end_ranges: SmallVec<[Range; 1]> = SmallVec::with_capacity(selection.len());
  let mut offset = 0isize;

  let transaction = Transaction::change_by_selection(doc, selection, |range| {
    let cursor = range.head;
    let change: Change = if !range.is_empty() {
      (range.from(), range.to(), Some(char_tendril(&[ch])))
    } else if slice.get_char(cursor) == Some(ch) && pairs.0.iter().any(|pair| pair.close == ch) {
      (cursor, cursor, None)
    } else if let Some(pair) = pairs
      .0
      .iter()
      .find(|pair| pair.open == ch && pair.should_close(slice, cursor))
    {
      (cursor, cursor, Some(char_tendril(&[pair.open, pair.close])))
    } else {
      (cursor, cursor, Some(char_tendril(&[ch])))
    };

    let (from, to, text) = &change;
    let inserted = text.as_ref().map_or(0, |text| text.chars().count());
    let head = (*from as isize + offset) as usize + 1;
    end_ranges.push(Range::point(head));
    offset += inserted as isize - (to - from) as isize;
    change
  })?;

  let selection = Selection::new(end_ranges, selection.primary_index())?;
  let transaction = transaction.with_selection(selection);
  tracing::trace!(?transaction, "auto pair transaction");
  Ok(Some(transaction))
}

/// Delete hook for backspace inside an empty pair. `None` unless every range
/// is a caret sitting between an opening and its closing character.
pub fn delete_hook(
  doc: &Rope,
  selection: &Selection,
  pairs: &AutoPairs,
) -> Result<Option<Transaction>> {
  let slice = doc.slice(..);
  let mut deletions = Vec::with_capacity(selection.len());

  for range in selection.iter() {
    if !range.is_empty() {
      return Ok(None);
    }
    let cursor = range.head;
    let (Some(prev), Some(next)) = (prev_char(slice, cursor), slice.get_char(cursor)) else {
      return Ok(None);
    };
    if !pairs
      .0
      .iter()
      .any(|pair| pair.open == prev && pair.close == next)
    {
      return Ok(None);
    }
    deletions.push((cursor - 1, cursor + 1, None));
  }

  let transaction = Transaction::change(doc, deletions)?;
  let selection = selection.clone().map(transaction.changes())?;
  Ok(Some(transaction.with_selection(selection)))
}
