//! The fixed key bindings of the editing surface.
//!
//! Bindings are written with the platform modifier `Mod` (ctrl or meta) and
//! resolve to a [`Command`]. Printable characters without a command modifier
//! are not bound here; the view inserts them directly.

use std::{
  collections::HashMap,
  fmt,
};

use crate::input::{
  Key,
  KeyEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
  MoveLeft,
  MoveRight,
  MoveUp,
  MoveDown,
  LineStart,
  LineEnd,
  DocumentStart,
  DocumentEnd,
  PageUp,
  PageDown,
  SelectAll,
  DeleteBackward,
  DeleteForward,
  InsertNewline,
  Undo,
  Redo,
  OpenSearch,
  FindNext,
  FindPrevious,
  /// Closes search and completion popups.
  Cancel,
  AcceptCompletion,
  /// Reserved for custom indentation; intentionally does nothing.
  Indent,
  Save,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
  pub code:    Key,
  pub shift:   bool,
  pub primary: bool,
  pub alt:     bool,
}

impl KeyBinding {
  pub const fn new(code: Key) -> Self {
    Self {
      code,
      shift: false,
      primary: false,
      alt: false,
    }
  }

  pub const fn with_primary(mut self) -> Self {
    self.primary = true;
    self
  }

  pub const fn with_shift(mut self) -> Self {
    self.shift = true;
    self
  }

  pub fn from_key_event(event: &KeyEvent) -> Self {
    // Shifted letters arrive upper-cased from some hosts.
    let code = match event.key {
      Key::Char(c) if event.modifiers.primary() => Key::Char(c.to_ascii_lowercase()),
      key => key,
    };
    Self {
      code,
      shift: event.modifiers.shift(),
      primary: event.modifiers.primary(),
      alt: event.modifiers.alt(),
    }
  }
}

impl fmt::Display for KeyBinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.primary {
      f.write_str("Mod-")?;
    }
    if self.alt {
      f.write_str("Alt-")?;
    }
    if self.shift {
      f.write_str("Shift-")?;
    }
    write!(f, "{}", self.code)
  }
}

#[derive(Debug, Clone)]
pub struct Keymap {
  bindings: HashMap<KeyBinding, Command>,
}

impl Default for Keymap {
  fn default() -> Self {
    use Command::*;

    let plain = KeyBinding::new;
    let primary = |key| KeyBinding::new(key).with_primary();
    let shifted = |key| KeyBinding::new(key).with_shift();

    let bindings = [
      // navigation and editing
      (plain(Key::Left), MoveLeft),
      (plain(Key::Right), MoveRight),
      (plain(Key::Up), MoveUp),
      (plain(Key::Down), MoveDown),
      (plain(Key::Home), LineStart),
      (plain(Key::End), LineEnd),
      (primary(Key::Home), DocumentStart),
      (primary(Key::End), DocumentEnd),
      (plain(Key::PageUp), PageUp),
      (plain(Key::PageDown), PageDown),
      (primary(Key::Char('a')), SelectAll),
      (plain(Key::Backspace), DeleteBackward),
      (plain(Key::Delete), DeleteForward),
      (plain(Key::Enter), InsertNewline),
      (plain(Key::Escape), Cancel),
      // history
      (primary(Key::Char('z')), Undo),
      (primary(Key::Char('z')).with_shift(), Redo),
      (primary(Key::Char('y')), Redo),
      // search
      (primary(Key::Char('f')), OpenSearch),
      (plain(Key::F3), FindNext),
      (primary(Key::Char('g')), FindNext),
      (shifted(Key::F3), FindPrevious),
      (primary(Key::Char('g')).with_shift(), FindPrevious),
      // completion, falling back to the reserved indent slot
      (plain(Key::Tab), AcceptCompletion),
      (shifted(Key::Tab), Indent),
      (primary(Key::Char('s')), Save),
    ];

    Self {
      bindings: bindings.into_iter().collect(),
    }
  }
}

impl Keymap {
  pub fn lookup(&self, event: &KeyEvent) -> Option<Command> {
    self
      .bindings
      .get(&KeyBinding::from_key_event(event))
      .copied()
  }

  pub fn bindings(&self) -> impl Iterator<Item = (&KeyBinding, &Command)> {
    self.bindings.iter()
  }
}
