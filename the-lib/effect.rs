//! Tagged instructions carried by transactions.
//!
//! State fields never get written directly; they read the effects of each
//! dispatched transaction, in order, and derive their next value.

use crate::{
  completion::CompletionItem,
  extension::SlotId,
  movement::Direction,
  syntax::LanguageSupport,
  tooltip::TooltipToggle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  /// Replace the editable slot.
  SetEditable(bool),
  /// Replace the content of the language slot `slot`.
  ReconfigureLanguage {
    slot:    SlotId,
    binding: Option<LanguageSupport>,
  },
  /// Show or hide the read-only notice.
  ReadOnlyTooltip(TooltipToggle),
  /// Open a completion list for the word before the primary caret.
  OpenCompletion(Vec<CompletionItem>),
  /// Move the highlighted completion item.
  CycleCompletion(Direction),
  CloseCompletion,
  /// Set (or clear with `None`) the search query.
  SetSearchQuery(Option<String>),
}
