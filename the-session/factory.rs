//! Building views.

use std::{
  fmt,
  sync::Arc,
};

use the_lib::{
  config::SessionConfig,
  extension::{
    Extension,
    ExtensionSet,
    base_extensions,
  },
  state::EditorState,
};

use crate::{
  container::Container,
  scroll::{
    ScrollObserver,
    ScrollReporter,
  },
  view::{
    SaveCallback,
    View,
    ViewError,
    ViewHandle,
  },
};

/// Host hooks a view reports to.
#[derive(Clone, Default)]
pub struct ViewCallbacks {
  pub on_save:   Option<SaveCallback>,
  pub on_scroll: Option<Arc<dyn ScrollObserver>>,
}

impl ViewCallbacks {
  pub fn on_save(mut self, on_save: impl Fn(&str) + Send + Sync + 'static) -> Self {
    self.on_save = Some(Arc::new(on_save));
    self
  }

  pub fn on_scroll(mut self, observer: impl ScrollObserver) -> Self {
    self.on_scroll = Some(Arc::new(observer));
    self
  }
}

impl fmt::Debug for ViewCallbacks {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ViewCallbacks")
      .field("on_save", &self.on_save.is_some())
      .field("on_scroll", &self.on_scroll.is_some())
      .finish()
  }
}

/// The full extension list of a new view: the fixed behaviors, the editable
/// slot, the read-only notice, then `extra`.
pub fn view_extensions(
  config: &SessionConfig,
  extra: impl IntoIterator<Item = Extension>,
) -> Vec<Extension> {
  base_extensions(config.tab_size)
    .into_iter()
    .chain([Extension::EditableSlot(true), Extension::ReadOnlyTooltips])
    .chain(extra)
    .collect()
}

/// Build a view inside `container`. The container must not host a live view.
pub fn create_view(
  container: &Container,
  config: &SessionConfig,
  callbacks: ViewCallbacks,
  extra: impl IntoIterator<Item = Extension>,
) -> Result<ViewHandle, ViewError> {
  container.attach()?;

  let extensions = ExtensionSet::resolve(view_extensions(config, extra));
  let state = EditorState::new("", extensions);
  let scroll_reporter = match callbacks.on_scroll {
    Some(observer) if tokio::runtime::Handle::try_current().is_ok() => {
      Some(ScrollReporter::new(config.scroll.debounce(), observer).start())
    },
    Some(_) => {
      log::warn!("no tokio runtime, scroll positions will not be reported");
      None
    },
    None => None,
  };

  log::debug!("view created in `{}`", container.name());
  Ok(ViewHandle::new(View::new(
    container.clone(),
    state,
    callbacks.on_save,
    scroll_reporter,
  )))
}
