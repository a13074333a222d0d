//! Literal, case-insensitive search within a rope.
//!
//! Positions are character indices. Both directions wrap around the end of
//! the document, so any query present in the text is always found.

use ropey::RopeSlice;

use crate::selection::{
  Range,
  Selection,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
  Next,
  Prev,
}

fn chars_eq(a: char, b: char) -> bool {
  a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn matches_at(text: RopeSlice, query: &[char], pos: usize) -> bool {
  if pos + query.len() > text.len_chars() {
    return false;
  }
  text
    .chars_at(pos)
    .zip(query)
    .all(|(ch, expected)| chars_eq(ch, *expected))
}

/// Start of the first match at or after `pos`, wrapping to the document start.
pub fn find_next(text: RopeSlice, query: &str, pos: usize) -> Option<usize> {
  let query: Vec<char> = query.chars().collect();
  if query.is_empty() {
    return None;
  }
  let len = text.len_chars();
  let pos = pos.min(len);
  (pos..len)
    .chain(0..pos)
    .find(|start| matches_at(text, &query, *start))
}

/// Start of the last match that begins before `pos`, wrapping to the
/// document end.
pub fn find_prev(text: RopeSlice, query: &str, pos: usize) -> Option<usize> {
  let query: Vec<char> = query.chars().collect();
  if query.is_empty() {
    return None;
  }
  let len = text.len_chars();
  let pos = pos.min(len);
  (0..pos)
    .rev()
    .chain((pos..len).rev())
    .find(|start| matches_at(text, &query, *start))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
  query: Option<String>,
}

impl SearchState {
  pub fn query(&self) -> Option<&str> {
    self.query.as_deref()
  }

  pub fn is_open(&self) -> bool {
    self.query.is_some()
  }

  pub fn set_query(&mut self, query: Option<String>) {
    self.query = query;
  }

  /// Selection covering the next match relative to the primary range, or
  /// `None` when there is no query or no match.
  pub fn step(
    &self,
    text: RopeSlice,
    selection: &Selection,
    direction: SearchDirection,
  ) -> Option<Selection> {
    let query = self.query.as_deref()?;
    let primary = selection.primary();
    let start = match direction {
      SearchDirection::Next => find_next(text, query, primary.to())?,
      SearchDirection::Prev => find_prev(text, query, primary.from())?,
    };
    let end = start + query.chars().count();
    Some(Selection::single(start, end))
  }
}

/// Every match of `query` in the text, for highlighting.
pub fn find_all(text: RopeSlice, query: &str) -> Vec<Range> {
  let needle: Vec<char> = query.chars().collect();
  if needle.is_empty() {
    return Vec::new();
  }
  let mut ranges = Vec::new();
  let mut pos = 0;
  while pos + needle.len() <= text.len_chars() {
    if matches_at(text, &needle, pos) {
      ranges.push(Range::new(pos, pos + needle.len()));
      pos += needle.len();
    } else {
      pos += 1;
    }
  }
  ranges
}
