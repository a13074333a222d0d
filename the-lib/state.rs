//! Editor state: the buffer plus every field derived from dispatched
//! transactions.
//!
//! Nothing here is written directly from outside. [`EditorState::apply`]
//! applies the changes, then walks the transaction's effects in order and
//! recomputes the derived fields (tooltips, completion) from the result.

use std::ops::RangeInclusive;

use ropey::Rope;
use thiserror::Error;

use crate::{
  auto_pairs::{
    AutoPairs,
    AutoPairsError,
  },
  buffer::{
    Buffer,
    BufferError,
  },
  completion::CompletionState,
  effect::Effect,
  extension::{
    Extension,
    ExtensionSet,
  },
  movement::Direction,
  search::SearchState,
  selection::{
    Range,
    Selection,
    SelectionError,
  },
  syntax::{
    DEFAULT_BRACKETS,
    LanguageSupport,
  },
  tooltip::{
    Tooltip,
    TooltipState,
  },
  transaction::{
    Transaction,
    TransactionError,
  },
};

pub type Result<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
  #[error(transparent)]
  Buffer(#[from] BufferError),
  #[error(transparent)]
  Transaction(#[from] TransactionError),
  #[error(transparent)]
  Selection(#[from] SelectionError),
  #[error(transparent)]
  AutoPairs(#[from] AutoPairsError),
}

#[derive(Debug)]
pub struct EditorState {
  buffer:     Buffer,
  extensions: ExtensionSet,
  tooltips:   TooltipState,
  completion: Option<CompletionState>,
  search:     SearchState,
}

impl EditorState {
  pub fn new(text: &str, extensions: ExtensionSet) -> Self {
    Self {
      buffer: Buffer::new(Rope::from(text)),
      extensions,
      tooltips: TooltipState::Hidden,
      completion: None,
      search: SearchState::default(),
    }
  }

  pub fn apply(&mut self, tx: &Transaction) -> Result<()> {
    self.buffer.apply(tx)?;
    if !tx.changes().is_empty() {
      if !self.extensions.contains(&Extension::History) {
        self.buffer.forget();
      } else if tx.add_to_history() {
        self.buffer.commit()?;
      } else {
        // Older revisions no longer line up with the text.
        self.buffer.clear_history();
      }
    }

    let caret = self.buffer.selection().primary().head;
    if let Some(completion) = self.completion.take() {
      self.completion = completion.map(tx.changes(), self.buffer.text(), caret);
    }

    for effect in tx.effects() {
      match effect {
        Effect::SetEditable(editable) => {
          if self.extensions.set_editable(*editable) != *editable {
            tracing::debug!(editable, "editable slot reconfigured");
          }
        },
        Effect::ReconfigureLanguage { slot, binding } => {
          if self.extensions.reconfigure_language(*slot, *binding) {
            tracing::debug!(
              language = binding.map(|support| support.name()),
              "language slot reconfigured"
            );
          } else {
            tracing::warn!(slot = slot.get(), "language slot is not installed");
          }
        },
        Effect::OpenCompletion(items) => {
          if self.extensions.contains(&Extension::Autocompletion) {
            self.completion = CompletionState::open(items.clone(), self.buffer.text(), caret);
          }
        },
        Effect::CycleCompletion(direction) => {
          if let Some(completion) = self.completion.as_mut() {
            match direction {
              Direction::Forward => completion.select_next(),
              Direction::Backward => completion.select_previous(),
            }
          }
        },
        Effect::CloseCompletion => self.completion = None,
        Effect::SetSearchQuery(query) => self.search.set_query(query.clone()),
        Effect::ReadOnlyTooltip(_) => {},
      }
    }

    if self.read_only() {
      self.completion = None;
    }
    self.tooltips = if self.extensions.contains(&Extension::ReadOnlyTooltips) {
      self
        .tooltips
        .update(self.read_only(), tx, self.buffer.selection())
    } else {
      TooltipState::Hidden
    };
    Ok(())
  }

  pub fn undo(&mut self) -> Result<bool> {
    self.jump(Buffer::undo)
  }

  pub fn redo(&mut self) -> Result<bool> {
    self.jump(Buffer::redo)
  }

  fn jump(
    &mut self,
    step: fn(&mut Buffer) -> std::result::Result<bool, BufferError>,
  ) -> Result<bool> {
    if !self.extensions.contains(&Extension::History) {
      return Ok(false);
    }
    let moved = step(&mut self.buffer)?;
    if moved {
      self.completion = None;
    }
    Ok(moved)
  }

  pub fn buffer(&self) -> &Buffer {
    &self.buffer
  }

  pub fn text(&self) -> &Rope {
    self.buffer.text()
  }

  pub fn selection(&self) -> &Selection {
    self.buffer.selection()
  }

  pub fn extensions(&self) -> &ExtensionSet {
    &self.extensions
  }

  pub fn editable(&self) -> bool {
    self.extensions.editable()
  }

  /// Always the negation of the editable slot.
  pub fn read_only(&self) -> bool {
    !self.extensions.editable()
  }

  pub fn language(&self) -> Option<LanguageSupport> {
    self.extensions.language()
  }

  pub fn tooltip_state(&self) -> &TooltipState {
    &self.tooltips
  }

  pub fn tooltips(&self) -> &[Tooltip] {
    self.tooltips.tooltips()
  }

  pub fn completion(&self) -> Option<&CompletionState> {
    self.completion.as_ref()
  }

  pub fn search(&self) -> &SearchState {
    &self.search
  }

  pub fn tab_size(&self) -> usize {
    self.extensions.tab_size()
  }

  /// Pairs for the close-brackets behavior, if it is installed.
  pub fn auto_pairs(&self) -> Option<AutoPairs> {
    if !self.extensions.contains(&Extension::CloseBrackets) {
      return None;
    }
    let pairs = self
      .language()
      .map_or(DEFAULT_BRACKETS, |support| support.close_brackets());
    Some(AutoPairs::new(pairs))
  }

  pub fn line_count(&self) -> usize {
    self.text().len_lines()
  }

  /// One-based numbers for the gutter.
  pub fn line_numbers(&self) -> Option<RangeInclusive<usize>> {
    self
      .extensions
      .contains(&Extension::LineNumbers)
      .then(|| 1..=self.line_count())
  }

  /// Zero-based lines holding a cursor head.
  pub fn active_lines(&self) -> Vec<usize> {
    if !self.extensions.contains(&Extension::HighlightActiveLine) {
      return Vec::new();
    }
    let text = self.text();
    let mut lines: Vec<usize> = self
      .selection()
      .iter()
      .map(|range| text.char_to_line(range.head.min(text.len_chars())))
      .collect();
    lines.dedup();
    lines
  }

  /// Non-empty ranges to paint as selections.
  pub fn drawn_selections(&self) -> Vec<Range> {
    if !self.extensions.contains(&Extension::DrawSelection) {
      return Vec::new();
    }
    self
      .selection()
      .iter()
      .filter(|range| !range.is_empty())
      .copied()
      .collect()
  }

  fn indent_width(&self, line: usize) -> Option<usize> {
    let tab_size = self.tab_size();
    let mut width = 0;
    for ch in self.text().line(line).chars() {
      match ch {
        ' ' => width += 1,
        '\t' => width += tab_size - width % tab_size.max(1),
        '\n' | '\r' => return None,
        _ => return Some(width),
      }
    }
    None
  }

  /// Lines `(start, end)` folded by the gutter marker on `line`.
  pub fn fold_range(&self, line: usize) -> Option<(usize, usize)> {
    if !self.extensions.contains(&Extension::FoldGutter)
      || !self.language().is_none_or(|support| support.folds_by_indent())
      || line >= self.line_count()
    {
      return None;
    }
    let indent = self.indent_width(line)?;
    let mut end = line;
    for next in line + 1..self.line_count() {
      match self.indent_width(next) {
        None => continue,
        Some(width) if width > indent => end = next,
        Some(_) => break,
      }
    }
    (end > line).then_some((line, end))
  }

  pub fn foldable_lines(&self) -> Vec<usize> {
    (0..self.line_count())
      .filter(|line| self.fold_range(*line).is_some())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    completion::CompletionItem,
    extension::{
      LanguageSlot,
      base_extensions,
    },
    syntax::language_for_extension,
    tooltip::TooltipToggle,
  };

  fn state(text: &str, language: &LanguageSlot) -> EditorState {
    let extensions = ExtensionSet::resolve(base_extensions(2).into_iter().chain([
      Extension::EditableSlot(true),
      Extension::ReadOnlyTooltips,
      language.of(None),
    ]));
    EditorState::new(text, extensions)
  }

  #[test]
  fn read_only_follows_editable_slot() {
    let slot = LanguageSlot::new();
    let mut state = state("abc", &slot);
    assert!(!state.read_only());

    let tx = Transaction::effects_only(state.text(), [Effect::SetEditable(false)]);
    state.apply(&tx).unwrap();
    assert!(state.read_only());
    assert!(!state.editable());
  }

  #[test]
  fn becoming_editable_clears_tooltips() {
    let slot = LanguageSlot::new();
    let mut state = state("abc", &slot);
    let text = state.text().clone();
    state
      .apply(&Transaction::effects_only(&text, [
        Effect::SetEditable(false),
        Effect::ReadOnlyTooltip(TooltipToggle::Show),
      ]))
      .unwrap();
    assert_eq!(state.tooltips().len(), 1);

    state
      .apply(&Transaction::effects_only(&text, [Effect::SetEditable(true)]))
      .unwrap();
    assert!(state.tooltips().is_empty());
  }

  #[test]
  fn replacement_commits_one_revision() {
    let slot = LanguageSlot::new();
    let mut state = state("old", &slot);
    let tx = Transaction::replace_all(state.text(), "new text").unwrap();
    state.apply(&tx).unwrap();
    assert_eq!(*state.text(), "new text");
    assert_eq!(state.selection(), &Selection::point(0));
    assert_eq!(state.buffer().history().len(), 2);

    assert!(state.undo().unwrap());
    assert_eq!(*state.text(), "old");
  }

  #[test]
  fn edits_outside_history_drop_older_revisions() {
    let slot = LanguageSlot::new();
    let mut state = state("old", &slot);
    let tx = Transaction::replace_all(state.text(), "mid").unwrap();
    state.apply(&tx).unwrap();
    assert_eq!(state.buffer().history().len(), 2);

    let tx = Transaction::replace_all(state.text(), "new")
      .unwrap()
      .without_history();
    state.apply(&tx).unwrap();
    assert_eq!(state.buffer().history().len(), 1);
    assert!(!state.undo().unwrap());
    assert_eq!(*state.text(), "new");
  }

  #[test]
  fn language_effect_targets_installed_slot_only() {
    let slot = LanguageSlot::new();
    let mut state = state("", &slot);
    let css = language_for_extension("css");

    let stray = Transaction::effects_only(state.text(), [Effect::ReconfigureLanguage {
      slot:    LanguageSlot::new().id(),
      binding: css,
    }]);
    state.apply(&stray).unwrap();
    assert_eq!(state.language(), None);

    let tx = Transaction::effects_only(state.text(), [Effect::ReconfigureLanguage {
      slot:    slot.id(),
      binding: css,
    }]);
    state.apply(&tx).unwrap();
    assert_eq!(state.language(), css);
  }

  #[test]
  fn read_only_closes_completion() {
    let slot = LanguageSlot::new();
    let mut state = state("con", &slot);
    let text = state.text().clone();
    state
      .apply(
        &Transaction::new(&text)
          .with_selection(Selection::point(3))
          .with_effect(Effect::OpenCompletion(vec![CompletionItem::new("const")])),
      )
      .unwrap();
    assert!(state.completion().is_some());

    state
      .apply(&Transaction::effects_only(&text, [Effect::SetEditable(false)]))
      .unwrap();
    assert!(state.completion().is_none());
  }

  #[test]
  fn gutters_and_active_line() {
    let slot = LanguageSlot::new();
    let mut state = state("fn {\n  a\n\n  b\n}\n", &slot);
    assert_eq!(state.line_numbers(), Some(1..=6));
    assert_eq!(state.fold_range(0), Some((0, 3)));
    assert_eq!(state.fold_range(1), None);
    assert_eq!(state.foldable_lines(), vec![0]);

    let text = state.text().clone();
    state
      .apply(&Transaction::new(&text).with_selection(Selection::single(6, 8)))
      .unwrap();
    assert_eq!(state.active_lines(), vec![1]);
    assert_eq!(state.drawn_selections(), vec![Range::new(6, 8)]);
  }

  #[test]
  fn markdown_does_not_fold() {
    let slot = LanguageSlot::new();
    let mut state = state("# a\n  b\n", &slot);
    let tx = Transaction::effects_only(state.text(), [Effect::ReconfigureLanguage {
      slot:    slot.id(),
      binding: language_for_extension("md"),
    }]);
    state.apply(&tx).unwrap();
    assert!(state.foldable_lines().is_empty());
  }
}
