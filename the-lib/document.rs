//! The externally owned document value.
//!
//! A [`Document`] is what the host hands to the session on every update. The
//! session only reads it; edits flow back to the host through callbacks.

use std::path::{
  Path,
  PathBuf,
};

use crate::{
  syntax::{
    LanguageSupport,
    language_for_path,
  },
  view::ScrollOffset,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  pub value:           String,
  /// Identity of the document.
  pub file_path:       PathBuf,
  pub is_binary:       bool,
  pub scroll_position: Option<ScrollOffset>,
}

impl Document {
  pub fn new(file_path: impl Into<PathBuf>, value: impl Into<String>) -> Self {
    Self {
      value:           value.into(),
      file_path:       file_path.into(),
      is_binary:       false,
      scroll_position: None,
    }
  }

  pub fn binary(mut self, is_binary: bool) -> Self {
    self.is_binary = is_binary;
    self
  }

  pub fn with_scroll(mut self, offset: ScrollOffset) -> Self {
    self.scroll_position = Some(offset);
    self
  }

  pub fn path(&self) -> &Path {
    &self.file_path
  }

  /// Offset to restore when the document is shown; the origin when unset.
  pub fn scroll_target(&self) -> ScrollOffset {
    self.scroll_position.unwrap_or(ScrollOffset::ORIGIN)
  }

  pub fn language(&self) -> Option<LanguageSupport> {
    language_for_path(&self.file_path)
  }

  /// Whether `other` refers to the same file.
  pub fn same_file(&self, other: &Document) -> bool {
    self.file_path == other.file_path
  }
}
