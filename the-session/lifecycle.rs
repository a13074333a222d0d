//! Owning the single view of a container.

use the_lib::{
  config::SessionConfig,
  extension::Extension,
};

use crate::{
  container::Container,
  factory::{
    ViewCallbacks,
    create_view,
  },
  view::{
    ViewError,
    ViewHandle,
    WeakViewHandle,
  },
};

/// Creates the view on mount and destroys it on unmount. Holds the only
/// owning handle; everything else gets a [`WeakViewHandle`].
#[derive(Debug)]
pub struct LifecycleOwner {
  container: Container,
  view:      Option<ViewHandle>,
}

impl LifecycleOwner {
  pub fn new(container: Container) -> Self {
    Self {
      container,
      view: None,
    }
  }

  pub fn container(&self) -> &Container {
    &self.container
  }

  pub fn mount(
    &mut self,
    config: &SessionConfig,
    callbacks: ViewCallbacks,
    extra: impl IntoIterator<Item = Extension>,
  ) -> Result<WeakViewHandle, ViewError> {
    if self.view.is_some() {
      return Err(ViewError::AlreadyMounted {
        container: self.container.name().to_owned(),
      });
    }
    let view = create_view(&self.container, config, callbacks, extra)?;
    let weak = view.downgrade();
    self.view = Some(view);
    Ok(weak)
  }

  /// Destroy the view. Returns false when nothing was mounted.
  pub fn unmount(&mut self) -> bool {
    match self.view.take() {
      Some(view) => {
        view.lock().destroy();
        true
      },
      None => false,
    }
  }

  pub fn view(&self) -> Option<WeakViewHandle> {
    self.view.as_ref().map(ViewHandle::downgrade)
  }

  pub fn is_mounted(&self) -> bool {
    self.view.is_some()
  }
}

impl Drop for LifecycleOwner {
  fn drop(&mut self) {
    self.unmount();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mount_once_until_unmounted() {
    let config = SessionConfig::default();
    let mut owner = LifecycleOwner::new(Container::new("editor"));
    let weak = owner.mount(&config, ViewCallbacks::default(), []).unwrap();
    assert!(weak.is_live());
    assert!(matches!(
      owner.mount(&config, ViewCallbacks::default(), []),
      Err(ViewError::AlreadyMounted { .. })
    ));

    assert!(owner.unmount());
    assert!(!owner.unmount());
    assert!(!weak.is_live());
    assert!(!owner.container().is_mounted());
    assert!(owner.view().is_none());

    assert!(owner.mount(&config, ViewCallbacks::default(), []).is_ok());
  }

  #[test]
  fn drop_releases_the_container() {
    let container = Container::new("editor");
    let weak = {
      let mut owner = LifecycleOwner::new(container.clone());
      owner
        .mount(&SessionConfig::default(), ViewCallbacks::default(), [])
        .unwrap()
    };
    assert!(!weak.is_live());
    assert!(!container.is_mounted());
  }

  #[test]
  fn two_owners_cannot_share_a_container() {
    let container = Container::new("editor");
    let mut first = LifecycleOwner::new(container.clone());
    let mut second = LifecycleOwner::new(container);
    first
      .mount(&SessionConfig::default(), ViewCallbacks::default(), [])
      .unwrap();
    assert!(matches!(
      second.mount(&SessionConfig::default(), ViewCallbacks::default(), []),
      Err(ViewError::AlreadyMounted { .. })
    ));
    assert!(!second.is_mounted());
  }
}
