//! Debounced scroll position reporting.
//!
//! Only events from the view's own scroller count; scrolling inside nested
//! children (tooltips, the completion list) is ignored. Within a debounce
//! window later offsets supersede earlier ones and a single report carries
//! the last one.
//!
//! The latest offset lives in a cell shared by the view and the reporter.
//! Channel events only wake the reporter and move its deadline, so a full
//! channel can drop them without losing the offset that gets reported.

use std::{
  fmt,
  sync::Arc,
  time::Duration,
};

use parking_lot::Mutex;
use the_lib::view::{
  ScrollEvent,
  ScrollOffset,
};
use the_session_event::{
  AsyncHook,
  try_send,
};
use tokio::{
  sync::mpsc::Sender,
  time::Instant,
};

/// External sink for debounced scroll offsets.
pub trait ScrollObserver: Send + Sync + 'static {
  fn scrolled(&self, offset: ScrollOffset);
}

impl<F> ScrollObserver for F
where
  F: Fn(ScrollOffset) + Send + Sync + 'static,
{
  fn scrolled(&self, offset: ScrollOffset) {
    self(offset)
  }
}

type LatestOffset = Arc<Mutex<Option<ScrollOffset>>>;

pub struct ScrollReporter {
  window:   Duration,
  latest:   LatestOffset,
  observer: Arc<dyn ScrollObserver>,
}

impl ScrollReporter {
  pub fn new(window: Duration, observer: Arc<dyn ScrollObserver>) -> Self {
    Self {
      window,
      latest: LatestOffset::default(),
      observer,
    }
  }

  /// Spawn the reporter and return the feed the view writes to.
  pub fn start(self) -> ScrollFeed {
    let latest = self.latest.clone();
    ScrollFeed {
      latest,
      tx: self.spawn(),
    }
  }
}

impl AsyncHook for ScrollReporter {
  type Event = ScrollEvent;

  fn handle_event(&mut self, event: Self::Event, timeout: Option<Instant>) -> Option<Instant> {
    if !event.is_from_scroller() {
      return timeout;
    }
    Self::debounce(self.window)
  }

  fn finish_debounce(&mut self) {
    if let Some(offset) = self.latest.lock().take() {
      log::trace!("reporting scroll offset {offset}");
      self.observer.scrolled(offset);
    }
  }
}

/// Write side of a running [`ScrollReporter`]. Never blocks.
#[derive(Clone)]
pub struct ScrollFeed {
  latest: LatestOffset,
  tx:     Sender<ScrollEvent>,
}

impl ScrollFeed {
  pub fn push(&self, event: ScrollEvent) {
    if event.is_from_scroller() {
      *self.latest.lock() = Some(event.offset);
    }
    try_send(&self.tx, event);
  }
}

impl fmt::Debug for ScrollFeed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ScrollFeed")
      .field("latest", &*self.latest.lock())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn recorder() -> (Arc<Mutex<Vec<ScrollOffset>>>, Arc<dyn ScrollObserver>) {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let observer: Arc<dyn ScrollObserver> =
      Arc::new(move |offset: ScrollOffset| sink.lock().push(offset));
    (reports, observer)
  }

  #[tokio::test(start_paused = true)]
  async fn nested_events_do_not_report() {
    let (reports, observer) = recorder();
    let feed = ScrollReporter::new(Duration::from_millis(100), observer).start();

    feed.push(ScrollEvent::nested(ScrollOffset::new(5, 5)));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(reports.lock().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn separate_bursts_report_separately() {
    let (reports, observer) = recorder();
    let feed = ScrollReporter::new(Duration::from_millis(100), observer).start();

    feed.push(ScrollEvent::scroller(ScrollOffset::new(10, 0)));
    tokio::time::sleep(Duration::from_millis(150)).await;
    feed.push(ScrollEvent::scroller(ScrollOffset::new(20, 0)));
    feed.push(ScrollEvent::nested(ScrollOffset::new(99, 0)));
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(*reports.lock(), vec![
      ScrollOffset::new(10, 0),
      ScrollOffset::new(20, 0)
    ]);
  }

  #[tokio::test(start_paused = true)]
  async fn overflowing_burst_reports_last_offset() {
    let (reports, observer) = recorder();
    let feed = ScrollReporter::new(Duration::from_millis(100), observer).start();

    for top in 0..1_000 {
      feed.push(ScrollEvent::scroller(ScrollOffset::new(top, 0)));
    }
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(*reports.lock(), vec![ScrollOffset::new(999, 0)]);
  }
}
