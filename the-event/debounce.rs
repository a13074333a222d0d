//! Debounced async hooks.
//!
//! A hook runs as a background tokio task fed through a bounded channel.
//! Every event may push the hook's deadline forward; once the deadline passes
//! without a new event, [`AsyncHook::finish_debounce`] runs once.

use std::time::Duration;

use tokio::{
  sync::mpsc::{
    self,
    Sender,
    error::TrySendError,
  },
  time::Instant,
};

/// Default channel capacity for hooks.
const CHANNEL_CAPACITY: usize = 128;

pub trait AsyncHook: Sync + Send + 'static + Sized {
  type Event: Sync + Send + 'static;

  /// Called for every received event. Returns the deadline at which
  /// [`AsyncHook::finish_debounce`] should fire, `timeout` to keep the current
  /// one, or `None` to cancel it.
  fn handle_event(&mut self, event: Self::Event, timeout: Option<Instant>) -> Option<Instant>;

  /// Called once the debounce deadline elapses.
  fn finish_debounce(&mut self);

  /// Deadline for a trailing-edge debounce of `window` starting now.
  fn debounce(window: Duration) -> Option<Instant> {
    Some(Instant::now() + window)
  }

  fn spawn(self) -> Sender<Self::Event> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    // Outside a runtime (plain unit tests) events are simply never consumed.
    if tokio::runtime::Handle::try_current().is_ok() {
      tokio::spawn(run(self, rx));
    } else {
      log::debug!("no tokio runtime, async hook not started");
    }
    tx
  }
}

async fn run<Hook: AsyncHook>(mut hook: Hook, mut rx: mpsc::Receiver<Hook::Event>) {
  let mut deadline = None;
  loop {
    let event = match deadline {
      Some(at) => {
        match tokio::time::timeout_at(at, rx.recv()).await {
          Ok(event) => event,
          Err(_) => {
            hook.finish_debounce();
            deadline = None;
            continue;
          },
        }
      },
      None => rx.recv().await,
    };
    let Some(event) = event else {
      break;
    };
    deadline = hook.handle_event(event, deadline);
  }
}

/// Queue `data` without blocking. Returns whether the event was queued.
///
/// A full channel drops the event. Never blocks.
pub fn try_send<T>(tx: &Sender<T>, data: T) -> bool {
  match tx.try_send(data) {
    Ok(()) => true,
    Err(TrySendError::Full(_)) => {
      log::trace!("async hook channel full, event dropped");
      false
    },
    Err(TrySendError::Closed(_)) => {
      log::warn!("attempted to send to a closed async hook channel");
      false
    },
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    Mutex,
  };

  use super::*;

  struct Collect {
    window:  Duration,
    pending: Vec<u32>,
    flushed: Arc<Mutex<Vec<Vec<u32>>>>,
  }

  impl AsyncHook for Collect {
    type Event = u32;

    fn handle_event(&mut self, event: u32, _timeout: Option<Instant>) -> Option<Instant> {
      self.pending.push(event);
      Self::debounce(self.window)
    }

    fn finish_debounce(&mut self) {
      let batch = std::mem::take(&mut self.pending);
      self.flushed.lock().unwrap().push(batch);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn burst_is_flushed_once_after_quiet_window() {
    let flushed = Arc::new(Mutex::new(Vec::new()));
    let tx = Collect {
      window:  Duration::from_millis(100),
      pending: Vec::new(),
      flushed: flushed.clone(),
    }
    .spawn();

    for n in 0..3 {
      assert!(try_send(&tx, n));
      tokio::time::sleep(Duration::from_millis(30)).await;
    }
    assert!(flushed.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(*flushed.lock().unwrap(), vec![vec![0, 1, 2]]);
  }

  #[test]
  fn try_send_reports_closed_channel() {
    let (tx, rx) = mpsc::channel::<u8>(1);
    assert!(try_send(&tx, 1));
    assert!(!try_send(&tx, 2));
    drop(rx);
    assert!(!try_send(&tx, 3));
  }
}
