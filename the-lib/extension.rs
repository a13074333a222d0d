//! The view's extension set and its reconfigurable slots.
//!
//! Most behaviors are fixed when the view is built. Two are held in [`Slot`]s
//! and can be swapped through effects without rebuilding the view: the
//! language binding and the editable flag.

use std::{
  mem,
  num::NonZeroU64,
  sync::atomic::{
    AtomicU64,
    Ordering,
  },
};

use crate::syntax::LanguageSupport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(NonZeroU64);

impl SlotId {
  pub fn fresh() -> Self {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
  }

  pub fn get(self) -> u64 {
    self.0.get()
  }
}

/// An indirection cell whose content is only ever replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot<T> {
  id:    SlotId,
  value: T,
}

impl<T> Slot<T> {
  pub fn new(id: SlotId, value: T) -> Self {
    Self { id, value }
  }

  pub fn id(&self) -> SlotId {
    self.id
  }

  pub fn get(&self) -> &T {
    &self.value
  }

  /// Swap in `value`, returning the previous content.
  pub fn reconfigure(&mut self, value: T) -> T {
    mem::replace(&mut self.value, value)
  }
}

/// Caller-side handle for a language slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageSlot(SlotId);

impl Default for LanguageSlot {
  fn default() -> Self {
    Self::new()
  }
}

impl LanguageSlot {
  pub fn new() -> Self {
    Self(SlotId::fresh())
  }

  pub fn id(&self) -> SlotId {
    self.0
  }

  /// The extension that installs this slot with an initial binding.
  pub fn of(&self, binding: Option<LanguageSupport>) -> Extension {
    Extension::LanguageSlot {
      slot: self.0,
      binding,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
  HighlightTheme,
  History,
  Keymap,
  Autocompletion,
  CloseBrackets,
  LineNumbers,
  FoldGutter,
  DrawSelection,
  HighlightActiveLine,
  TabSize(usize),
  /// Editable flag; read-only is derived as its negation.
  EditableSlot(bool),
  /// The read-only notice tooltip field.
  ReadOnlyTooltips,
  LanguageSlot {
    slot:    SlotId,
    binding: Option<LanguageSupport>,
  },
}

/// The always-on behaviors, in installation order.
pub fn base_extensions(tab_size: usize) -> Vec<Extension> {
  vec![
    Extension::HighlightTheme,
    Extension::History,
    Extension::Keymap,
    Extension::Autocompletion,
    Extension::CloseBrackets,
    Extension::LineNumbers,
    Extension::FoldGutter,
    Extension::DrawSelection,
    Extension::HighlightActiveLine,
    Extension::TabSize(tab_size),
  ]
}

pub const DEFAULT_TAB_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct ExtensionSet {
  installed: Vec<Extension>,
  editable:  Slot<bool>,
  language:  Option<Slot<Option<LanguageSupport>>>,
}

impl ExtensionSet {
  pub fn resolve(extensions: impl IntoIterator<Item = Extension>) -> Self {
    let mut installed = Vec::new();
    let mut editable = Slot::new(SlotId::fresh(), true);
    let mut language = None;

    for extension in extensions {
      match &extension {
        Extension::EditableSlot(value) => {
          editable.reconfigure(*value);
        },
        Extension::LanguageSlot { slot, binding } => {
          if language.is_some() {
            tracing::warn!(slot = slot.get(), "ignoring second language slot");
            continue;
          }
          language = Some(Slot::new(*slot, *binding));
        },
        _ => {},
      }
      installed.push(extension);
    }

    Self {
      installed,
      editable,
      language,
    }
  }

  pub fn installed(&self) -> &[Extension] {
    &self.installed
  }

  /// Whether a behavior of the same kind as `other` is installed.
  pub fn contains(&self, other: &Extension) -> bool {
    let kind = mem::discriminant(other);
    self
      .installed
      .iter()
      .any(|extension| mem::discriminant(extension) == kind)
  }

  pub fn tab_size(&self) -> usize {
    self
      .installed
      .iter()
      .rev()
      .find_map(|extension| match extension {
        Extension::TabSize(size) => Some(*size),
        _ => None,
      })
      .unwrap_or(DEFAULT_TAB_SIZE)
  }

  pub fn editable(&self) -> bool {
    *self.editable.get()
  }

  pub fn set_editable(&mut self, editable: bool) -> bool {
    self.editable.reconfigure(editable)
  }

  pub fn language(&self) -> Option<LanguageSupport> {
    self.language.as_ref().and_then(|slot| *slot.get())
  }

  pub fn language_slot(&self) -> Option<SlotId> {
    self.language.as_ref().map(Slot::id)
  }

  /// Replace the language slot content. Returns false when `slot` is not
  /// installed in this set.
  pub fn reconfigure_language(&mut self, slot: SlotId, binding: Option<LanguageSupport>) -> bool {
    match self.language.as_mut() {
      Some(installed) if installed.id() == slot => {
        installed.reconfigure(binding);
        true
      },
      _ => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::syntax::language_for_extension;

  #[test]
  fn slot_reconfigure_replaces_whole_value() {
    let mut slot = Slot::new(SlotId::fresh(), vec![1, 2]);
    let previous = slot.reconfigure(vec![3]);
    assert_eq!(previous, vec![1, 2]);
    assert_eq!(slot.get(), &vec![3]);
  }

  #[test]
  fn base_order_is_fixed() {
    let base = base_extensions(2);
    assert_eq!(base.first(), Some(&Extension::HighlightTheme));
    assert_eq!(base.last(), Some(&Extension::TabSize(2)));
    assert_eq!(base.len(), 10);
  }

  #[test]
  fn resolve_picks_up_slots() {
    let language = LanguageSlot::new();
    let js = language_for_extension("js");
    let mut set = ExtensionSet::resolve(
      base_extensions(2)
        .into_iter()
        .chain([Extension::EditableSlot(false), language.of(js)]),
    );

    assert!(!set.editable());
    assert_eq!(set.language(), js);
    assert_eq!(set.tab_size(), 2);
    assert!(set.contains(&Extension::TabSize(0)));
    assert!(!set.contains(&Extension::ReadOnlyTooltips));

    assert!(set.reconfigure_language(language.id(), None));
    assert_eq!(set.language(), None);
    assert!(!set.reconfigure_language(LanguageSlot::new().id(), js));
  }

  #[test]
  fn second_language_slot_is_ignored() {
    let first = LanguageSlot::new();
    let second = LanguageSlot::new();
    let set = ExtensionSet::resolve([first.of(None), second.of(language_for_extension("css"))]);
    assert_eq!(set.language_slot(), Some(first.id()));
    assert_eq!(set.language(), None);
  }
}
