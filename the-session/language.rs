//! Asynchronous resolution of language bindings.

use std::path::Path;

use async_trait::async_trait;
use the_lib::syntax::{
  LanguageSupport,
  language_for_path,
};

/// Resolves the binding for a file. Misses are `None`, never errors.
#[async_trait]
pub trait LanguageLoader: Send + Sync + 'static {
  async fn resolve(&self, path: &Path) -> Option<LanguageSupport>;
}

/// Resolves from the built-in extension table.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLoader;

#[async_trait]
impl LanguageLoader for BuiltinLoader {
  async fn resolve(&self, path: &Path) -> Option<LanguageSupport> {
    // Bindings are loaded on demand; never complete inline.
    tokio::task::yield_now().await;
    let support = language_for_path(path);
    if support.is_none() {
      log::debug!("no language binding for {}", path.display());
    }
    support
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn builtin_resolves_known_extensions() {
    let loader = BuiltinLoader;
    let ts = loader.resolve(Path::new("src/main.tsx")).await;
    assert_eq!(ts, Some(LanguageSupport::javascript(true, true)));
    assert_eq!(loader.resolve(Path::new("x.unknownext")).await, None);
  }
}
