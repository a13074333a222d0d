//! Editor session controller.
//!
//! Owns the live view of one container and keeps it in sync with the
//! document supplied by the host: text, editability, the language binding,
//! scroll position and focus.

pub mod container;
pub mod factory;
pub mod language;
pub mod lifecycle;
pub mod scroll;
pub mod session;
pub mod sync;
pub mod view;

pub use container::Container;
pub use factory::{
  ViewCallbacks,
  create_view,
};
pub use language::{
  BuiltinLoader,
  LanguageLoader,
};
pub use lifecycle::LifecycleOwner;
pub use scroll::{
  ScrollFeed,
  ScrollObserver,
  ScrollReporter,
};
pub use session::{
  Session,
  SessionError,
  SessionProps,
};
pub use sync::{
  DocumentSynchronizer,
  Focus,
  SyncOutcome,
  SyncTicket,
};
pub use view::{
  SaveCallback,
  View,
  ViewError,
  ViewHandle,
  WeakViewHandle,
};
