//! Completion list attached to the word before the primary caret.

use ropey::{
  Rope,
  RopeSlice,
};

use crate::{
  Tendril,
  selection::Selection,
  transaction::{
    Assoc,
    ChangeSet,
    Result,
    Transaction,
  },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
  pub label:  String,
  /// Text to insert; the label is used when absent.
  pub insert: Option<String>,
}

impl CompletionItem {
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label:  label.into(),
      insert: None,
    }
  }

  pub fn insert_text(&self) -> &str {
    self.insert.as_deref().unwrap_or(&self.label)
  }
}

fn is_word_char(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Start of the word that ends at `pos`.
pub fn word_start(text: RopeSlice, pos: usize) -> usize {
  let mut start = pos.min(text.len_chars());
  while start > 0 && is_word_char(text.char(start - 1)) {
    start -= 1;
  }
  start
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionState {
  items:    Vec<CompletionItem>,
  selected: usize,
  /// Start of the word being completed.
  from:     usize,
}

impl CompletionState {
  pub fn open(items: Vec<CompletionItem>, text: &Rope, caret: usize) -> Option<Self> {
    if items.is_empty() {
      return None;
    }
    Some(Self {
      items,
      selected: 0,
      from: word_start(text.slice(..), caret),
    })
  }

  pub fn items(&self) -> &[CompletionItem] {
    &self.items
  }

  pub fn selected(&self) -> &CompletionItem {
    &self.items[self.selected]
  }

  pub fn from(&self) -> usize {
    self.from
  }

  pub fn select_next(&mut self) {
    self.selected = (self.selected + 1) % self.items.len();
  }

  pub fn select_previous(&mut self) {
    self.selected = self
      .selected
      .checked_sub(1)
      .unwrap_or(self.items.len() - 1);
  }

  /// Replace the word before the primary caret with the selected item.
  pub fn accept(&self, text: &Rope, selection: &Selection) -> Result<Transaction> {
    let caret = selection.primary().head;
    let from = self.from.min(caret);
    let insert = self.selected().insert_text();
    let end = from + insert.chars().count();
    Ok(
      Transaction::change(text, [(from, caret, Some(Tendril::from(insert)))])?
        .with_selection(Selection::point(end)),
    )
  }

  /// Follow an edit. The list closes once the caret leaves the word.
  pub fn map(&self, changes: &ChangeSet, text: &Rope, caret: usize) -> Option<Self> {
    let from = changes.map_pos(self.from, Assoc::Before).ok()?;
    if caret < from || word_start(text.slice(..), caret) != from {
      return None;
    }
    Some(Self {
      from,
      ..self.clone()
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn items() -> Vec<CompletionItem> {
    vec![CompletionItem::new("console"), CompletionItem {
      label:  "const".into(),
      insert: Some("const ".into()),
    }]
  }

  #[test]
  fn accept_replaces_word_prefix() {
    let mut text = Rope::from("let x = con");
    let state = CompletionState::open(items(), &text, 11).unwrap();
    assert_eq!(state.from(), 8);

    let tx = state.accept(&text, &Selection::point(11)).unwrap();
    tx.apply(&mut text).unwrap();
    assert_eq!(text, "let x = console");
    assert_eq!(tx.selection(), Some(&Selection::point(15)));
  }

  #[test]
  fn selection_wraps() {
    let text = Rope::from("c");
    let mut state = CompletionState::open(items(), &text, 1).unwrap();
    state.select_previous();
    assert_eq!(state.selected().insert_text(), "const ");
    state.select_next();
    assert_eq!(state.selected().label, "console");
  }

  #[test]
  fn typing_a_separator_closes() {
    let text = Rope::from("co");
    let state = CompletionState::open(items(), &text, 2).unwrap();

    let tx = Transaction::change(&text, [(2, 2, Some("n".into()))]).unwrap();
    let mut typed = text.clone();
    tx.apply(&mut typed).unwrap();
    assert!(state.map(tx.changes(), &typed, 3).is_some());

    let tx = Transaction::change(&typed, [(3, 3, Some(" ".into()))]).unwrap();
    let mut spaced = typed.clone();
    tx.apply(&mut spaced).unwrap();
    assert!(state.map(tx.changes(), &spaced, 4).is_none());
  }

  #[test]
  fn empty_list_does_not_open() {
    assert!(CompletionState::open(Vec::new(), &Rope::from(""), 0).is_none());
  }
}
