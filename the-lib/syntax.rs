//! Language bindings keyed by file extension.
//!
//! A [`LanguageSupport`] is the syntax/indentation-aware behavior installed in
//! the view's language slot. Files whose extension is not in the table get no
//! binding and keep plain-text behavior.

use std::{
  fmt,
  path::Path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
  JavaScript,
  Html,
  Css,
  Json,
  Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageSupport {
  pub language:   Language,
  /// JSX element syntax (JavaScript family only).
  pub jsx:        bool,
  /// TypeScript type syntax (JavaScript family only).
  pub typescript: bool,
}

const CODE_BRACKETS: &[(char, char)] = &[
  ('(', ')'),
  ('[', ']'),
  ('{', '}'),
  ('\'', '\''),
  ('"', '"'),
  ('`', '`'),
];
const MARKUP_BRACKETS: &[(char, char)] = &[('(', ')'), ('[', ']'), ('{', '}'), ('"', '"')];
const JSON_BRACKETS: &[(char, char)] = &[('[', ']'), ('{', '}'), ('"', '"')];
const PROSE_BRACKETS: &[(char, char)] = &[('(', ')'), ('[', ']'), ('`', '`')];

/// Pairs used when no language binding is installed.
pub const DEFAULT_BRACKETS: &[(char, char)] = CODE_BRACKETS;

impl LanguageSupport {
  pub const fn javascript(jsx: bool, typescript: bool) -> Self {
    Self {
      language: Language::JavaScript,
      jsx,
      typescript,
    }
  }

  pub const fn plain(language: Language) -> Self {
    Self {
      language,
      jsx: false,
      typescript: false,
    }
  }

  pub fn name(&self) -> &'static str {
    match (self.language, self.jsx, self.typescript) {
      (Language::JavaScript, false, false) => "javascript",
      (Language::JavaScript, true, false) => "jsx",
      (Language::JavaScript, false, true) => "typescript",
      (Language::JavaScript, true, true) => "tsx",
      (Language::Html, ..) => "html",
      (Language::Css, ..) => "css",
      (Language::Json, ..) => "json",
      (Language::Markdown, ..) => "markdown",
    }
  }

  pub fn close_brackets(&self) -> &'static [(char, char)] {
    match self.language {
      Language::JavaScript | Language::Css => CODE_BRACKETS,
      Language::Html => MARKUP_BRACKETS,
      Language::Json => JSON_BRACKETS,
      Language::Markdown => PROSE_BRACKETS,
    }
  }

  pub fn line_comment(&self) -> Option<&'static str> {
    match self.language {
      Language::JavaScript => Some("//"),
      Language::Html | Language::Css | Language::Json | Language::Markdown => None,
    }
  }

  pub fn block_comment(&self) -> Option<(&'static str, &'static str)> {
    match self.language {
      Language::JavaScript | Language::Css => Some(("/*", "*/")),
      Language::Html | Language::Markdown => Some(("<!--", "-->")),
      Language::Json => None,
    }
  }

  /// Whether lines are folded by indentation for this language.
  pub fn folds_by_indent(&self) -> bool {
    !matches!(self.language, Language::Markdown)
  }
}

impl fmt::Display for LanguageSupport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Look up the binding for a bare extension (no leading dot).
pub fn language_for_extension(extension: &str) -> Option<LanguageSupport> {
  let support = match extension.to_ascii_lowercase().as_str() {
    "js" => LanguageSupport::javascript(false, false),
    "jsx" => LanguageSupport::javascript(true, false),
    "ts" => LanguageSupport::javascript(false, true),
    "tsx" => LanguageSupport::javascript(true, true),
    "html" => LanguageSupport::plain(Language::Html),
    "css" => LanguageSupport::plain(Language::Css),
    "json" => LanguageSupport::plain(Language::Json),
    "md" => LanguageSupport::plain(Language::Markdown),
    _ => return None,
  };
  Some(support)
}

pub fn language_for_path(path: &Path) -> Option<LanguageSupport> {
  let extension = path.extension()?.to_str()?;
  language_for_extension(extension)
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  #[test]
  fn extension_table() {
    let cases = [
      ("index.js", Some("javascript")),
      ("App.jsx", Some("jsx")),
      ("main.ts", Some("typescript")),
      ("view.tsx", Some("tsx")),
      ("index.html", Some("html")),
      ("style.css", Some("css")),
      ("package.json", Some("json")),
      ("README.md", Some("markdown")),
      ("x.unknownext", None),
      ("Makefile", None),
      (".js", None),
    ];
    for (path, expected) in cases {
      let resolved = language_for_path(&PathBuf::from(path)).map(|support| support.name());
      assert_eq!(resolved, expected, "{path}");
    }
  }

  #[test]
  fn extension_lookup_ignores_case() {
    assert_eq!(
      language_for_extension("JSON"),
      Some(LanguageSupport::plain(Language::Json))
    );
  }

  #[test]
  fn json_pairs_skip_single_quotes() {
    let json = LanguageSupport::plain(Language::Json);
    assert!(!json.close_brackets().iter().any(|(open, _)| *open == '\''));
    assert_eq!(json.line_comment(), None);
  }
}
