//! Key events delivered by the host.

use std::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modifiers {
  bits: u8,
}

impl Modifiers {
  pub const CTRL: u8 = 0b0000_0001;
  pub const ALT: u8 = 0b0000_0010;
  pub const SHIFT: u8 = 0b0000_0100;
  pub const META: u8 = 0b0000_1000;

  #[must_use]
  pub const fn empty() -> Self {
    Self { bits: 0 }
  }

  #[must_use]
  pub const fn from_bits(bits: u8) -> Self {
    Self { bits }
  }

  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.bits == 0
  }

  #[must_use]
  pub const fn ctrl(self) -> bool {
    (self.bits & Self::CTRL) != 0
  }

  #[must_use]
  pub const fn alt(self) -> bool {
    (self.bits & Self::ALT) != 0
  }

  #[must_use]
  pub const fn shift(self) -> bool {
    (self.bits & Self::SHIFT) != 0
  }

  #[must_use]
  pub const fn meta(self) -> bool {
    (self.bits & Self::META) != 0
  }

  /// The platform command modifier: ctrl, or meta on macOS-style hosts.
  #[must_use]
  pub const fn primary(self) -> bool {
    self.ctrl() || self.meta()
  }

  pub fn insert(&mut self, bits: u8) {
    self.bits |= bits;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
  Char(char),
  Enter,
  Escape,
  Backspace,
  Tab,
  Delete,
  Home,
  End,
  PageUp,
  PageDown,
  Left,
  Right,
  Up,
  Down,
  F3,
  Other,
}

impl fmt::Display for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Key::Char(' ') => f.write_str("space"),
      Key::Char(c) => write!(f, "{c}"),
      Key::Enter => f.write_str("ret"),
      Key::Escape => f.write_str("esc"),
      Key::Backspace => f.write_str("bs"),
      Key::Tab => f.write_str("tab"),
      Key::Delete => f.write_str("del"),
      Key::Home => f.write_str("home"),
      Key::End => f.write_str("end"),
      Key::PageUp => f.write_str("pgup"),
      Key::PageDown => f.write_str("pgdown"),
      Key::Left => f.write_str("left"),
      Key::Right => f.write_str("right"),
      Key::Up => f.write_str("up"),
      Key::Down => f.write_str("down"),
      Key::F3 => f.write_str("F3"),
      Key::Other => f.write_str("other"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
  pub key:       Key,
  pub modifiers: Modifiers,
}

impl KeyEvent {
  pub const fn new(key: Key, modifiers: Modifiers) -> Self {
    Self { key, modifiers }
  }

  pub const fn plain(key: Key) -> Self {
    Self::new(key, Modifiers::empty())
  }

  pub const fn char(c: char) -> Self {
    Self::plain(Key::Char(c))
  }

  /// `Ctrl` + key.
  pub const fn ctrl(key: Key) -> Self {
    Self::new(key, Modifiers::from_bits(Modifiers::CTRL))
  }

  /// The cancel key: it hides the read-only notice instead of showing it.
  pub fn is_cancel(&self) -> bool {
    self.key == Key::Escape
  }

  /// Text this event would type into the buffer, if any.
  pub fn text(&self) -> Option<char> {
    match self.key {
      Key::Char(c) if !self.modifiers.primary() && !self.modifiers.alt() => Some(c),
      _ => None,
    }
  }
}

/// What the view did with a key event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
  /// Not handled; the host may run its default action.
  #[default]
  Continue,
  /// Consumed; the host default must be suppressed.
  Handled,
}

impl KeyOutcome {
  pub fn is_handled(self) -> bool {
    self == KeyOutcome::Handled
  }
}
