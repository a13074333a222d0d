//! Event plumbing shared by the session crates.

mod debounce;

pub use debounce::{
  AsyncHook,
  try_send,
};
