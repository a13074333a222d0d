//! Host elements a view can be mounted into.

use std::{
  fmt,
  sync::{
    Arc,
    atomic::{
      AtomicBool,
      Ordering,
    },
  },
};

use crate::view::ViewError;

/// A host element. Clones refer to the same element.
#[derive(Clone)]
pub struct Container {
  inner: Arc<Inner>,
}

struct Inner {
  name:    String,
  mounted: AtomicBool,
}

impl Container {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      inner: Arc::new(Inner {
        name:    name.into(),
        mounted: AtomicBool::new(false),
      }),
    }
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  pub fn is_mounted(&self) -> bool {
    self.inner.mounted.load(Ordering::Acquire)
  }

  /// Claim the container for a new view. Fails while another view is attached.
  pub(crate) fn attach(&self) -> Result<(), ViewError> {
    self
      .inner
      .mounted
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .map(|_| ())
      .map_err(|_| {
        ViewError::AlreadyMounted {
          container: self.inner.name.clone(),
        }
      })
  }

  pub(crate) fn detach(&self) {
    self.inner.mounted.store(false, Ordering::Release);
  }

  pub fn same(&self, other: &Container) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("name", &self.inner.name)
      .field("mounted", &self.is_mounted())
      .finish()
  }
}
