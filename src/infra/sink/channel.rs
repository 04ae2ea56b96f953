//! Asynchronous notifier backed by a bounded crossbeam channel.
//!
//! `notify` only enqueues; a dedicated thread drains the backlog into the
//! wrapped sink. When the backlog is full the notification is rejected
//! instead of blocking the caller.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::sink::{Notification, NotificationSink, SinkError};

/// Non-blocking wrapper that forwards notifications on a background thread.
pub struct ChannelNotifier {
    tx: Mutex<Option<Sender<Notification>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    dropped: Arc<AtomicU64>,
}

impl ChannelNotifier {
    /// Spawn the forwarding thread with a backlog of `capacity` notifications.
    pub fn spawn(inner: Arc<dyn NotificationSink>, capacity: usize) -> io::Result<Self> {
        let (tx, rx) = bounded::<Notification>(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));
        let failures = Arc::clone(&dropped);
        let worker = thread::Builder::new()
            .name("atc-notifier".into())
            .spawn(move || {
                // Exits once every sender is gone.
                for notification in &rx {
                    if let Err(e) = inner.notify(&notification) {
                        failures.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %e, "notification delivery failed");
                    }
                }
                debug!("notifier thread exiting");
            })?;
        Ok(Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            dropped,
        })
    }

    /// Notifications rejected for backlog overflow or failed downstream.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting notifications, drain the backlog and join the thread.
    pub fn shutdown(&self) {
        self.tx.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                warn!("notifier thread panicked");
            }
        }
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(SinkError::Unavailable("notifier shut down".into()));
        };
        match tx.try_send(notification.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::Unavailable("notification backlog full".into()))
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(SinkError::Unavailable("notifier thread gone".into()))
            }
        }
    }
}

impl Drop for ChannelNotifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ChannelNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelNotifier")
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}
