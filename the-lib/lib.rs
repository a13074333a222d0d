use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod auto_pairs;
pub mod buffer;
pub mod command;
pub mod completion;
pub mod config;
pub mod document;
pub mod effect;
pub mod extension;
pub mod history;
pub mod input;
pub mod keymap;
pub mod movement;
pub mod search;
pub mod selection;
pub mod state;
pub mod syntax;
pub mod syntax_async;
pub mod tooltip;
pub mod transaction;
pub mod view;

pub type Tendril = SmartString<LazyCompact>;
