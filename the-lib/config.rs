//! Session configuration.
//!
//! Loaded from TOML. A project-local file is layered over the global one;
//! either may be missing, in which case the other (or the defaults) apply.

use std::{
  io::Error as IOError,
  time::Duration,
};

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;
use toml::Value;

use crate::extension::DEFAULT_TAB_SIZE;

pub const DEFAULT_SCROLL_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("bad config: {0}")]
  BadConfig(#[from] toml::de::Error),
  #[error(transparent)]
  Io(#[from] IOError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ScrollSettings {
  /// Quiet period before a burst of scroll events is reported.
  pub debounce_ms: u64,
}

impl Default for ScrollSettings {
  fn default() -> Self {
    Self {
      debounce_ms: DEFAULT_SCROLL_DEBOUNCE_MS,
    }
  }
}

impl ScrollSettings {
  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SessionConfig {
  pub scroll:   ScrollSettings,
  pub tab_size: usize,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      scroll:   ScrollSettings::default(),
      tab_size: 2,
    }
  }
}

impl SessionConfig {
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str::<Self>(source)?.normalized())
  }

  /// Layer `local` over `global`. IO errors on one side fall back to the
  /// other; a file that fails to parse is always an error.
  pub fn load(
    global: Result<String, ConfigError>,
    local: Result<String, ConfigError>,
  ) -> Result<Self, ConfigError> {
    let parse = |source: Result<String, ConfigError>| -> Result<Value, ConfigError> {
      source.and_then(|file| toml::from_str(&file).map_err(ConfigError::BadConfig))
    };

    let value = match (parse(global), parse(local)) {
      (Ok(global), Ok(local)) => merge_toml_values(global, local, 3),
      (_, Err(ConfigError::BadConfig(err))) | (Err(ConfigError::BadConfig(err)), _) => {
        return Err(ConfigError::BadConfig(err));
      },
      (Ok(value), Err(_)) | (Err(_), Ok(value)) => value,
      (Err(err), Err(_)) => {
        tracing::debug!(%err, "no session config found, using defaults");
        return Ok(Self::default());
      },
    };

    let config: Self = value.try_into()?;
    Ok(config.normalized())
  }

  fn normalized(self) -> Self {
    if self.tab_size == 0 {
      tracing::warn!(default = DEFAULT_TAB_SIZE, "tab-size of 0 replaced");
      return Self {
        tab_size: DEFAULT_TAB_SIZE,
        ..self
      };
    }
    self
  }
}

/// Merge two TOML documents, with `right` taking precedence.
///
/// Tables are merged key by key up to `merge_depth` levels; below that, and
/// for any other value kind, `right` replaces `left`. Arrays of tables are
/// merged by their `name` key.
pub fn merge_toml_values(left: Value, right: Value, merge_depth: usize) -> Value {
  fn get_name(v: &Value) -> Option<&str> {
    v.get("name").and_then(Value::as_str)
  }

  match (left, right) {
    (Value::Array(mut left_items), Value::Array(right_items)) => {
      if merge_depth == 0 {
        return Value::Array(right_items);
      }
      for rvalue in right_items {
        let lvalue = get_name(&rvalue)
          .and_then(|rname| left_items.iter().position(|v| get_name(v) == Some(rname)))
          .map(|lpos| left_items.remove(lpos));
        left_items.push(match lvalue {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        });
      }
      Value::Array(left_items)
    },
    (Value::Table(mut left_map), Value::Table(right_map)) => {
      if merge_depth == 0 {
        return Value::Table(right_map);
      }
      for (rname, rvalue) in right_map {
        let merged = match left_map.remove(&rname) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(rname, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}

#[cfg(test)]
mod tests {
  use std::io::ErrorKind;

  use super::*;

  fn missing() -> Result<String, ConfigError> {
    Err(IOError::from(ErrorKind::NotFound).into())
  }

  #[test]
  fn defaults() {
    let config = SessionConfig::default();
    assert_eq!(config.scroll.debounce(), Duration::from_millis(100));
    assert_eq!(config.tab_size, 2);
    assert_eq!(SessionConfig::load(missing(), missing()).unwrap(), config);
  }

  #[test]
  fn local_overrides_global_per_key() {
    let global = Ok("tab-size = 8\n[scroll]\ndebounce-ms = 250\n".to_string());
    let local = Ok("tab-size = 4\n".to_string());
    let config = SessionConfig::load(global, local).unwrap();
    assert_eq!(config.tab_size, 4);
    assert_eq!(config.scroll.debounce_ms, 250);
  }

  #[test]
  fn missing_local_uses_global() {
    let config = SessionConfig::load(Ok("tab-size = 3".into()), missing()).unwrap();
    assert_eq!(config.tab_size, 3);
  }

  #[test]
  fn unknown_keys_are_rejected() {
    let err = SessionConfig::from_toml_str("tabsize = 4").unwrap_err();
    assert!(matches!(err, ConfigError::BadConfig(_)));
    let err = SessionConfig::load(Ok("[scroll]\ndelay = 1".into()), missing()).unwrap_err();
    assert!(matches!(err, ConfigError::BadConfig(_)));
  }

  #[test]
  fn zero_tab_size_falls_back() {
    let config = SessionConfig::load(Ok("tab-size = 0".into()), missing()).unwrap();
    assert_eq!(config.tab_size, DEFAULT_TAB_SIZE);
    let config = SessionConfig::from_toml_str("tab-size = 0").unwrap();
    assert_eq!(config.tab_size, DEFAULT_TAB_SIZE);
  }

  #[test]
  fn merge_replaces_below_depth() {
    let left: Value = toml::from_str("[a.b]\nx = 1\ny = 2").unwrap();
    let right: Value = toml::from_str("[a.b]\nx = 3").unwrap();

    let deep = merge_toml_values(left.clone(), right.clone(), 3);
    assert_eq!(deep["a"]["b"]["y"].as_integer(), Some(2));
    assert_eq!(deep["a"]["b"]["x"].as_integer(), Some(3));

    let shallow = merge_toml_values(left, right, 1);
    assert!(shallow["a"]["b"].get("y").is_none());
  }
}
