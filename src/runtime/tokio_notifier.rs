//! Notification sink that hands delivery to a tokio runtime.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;

use crate::core::sink::{Notification, NotificationSink, SinkError};

/// Async notification backend (webhook, pager, message bus...).
#[async_trait]
pub trait AsyncNotificationSink: Send + Sync + 'static {
    /// Deliver one notification.
    async fn deliver(&self, notification: Notification) -> Result<(), SinkError>;
}

/// Bridges the synchronous [`NotificationSink`] contract used by worker
/// threads onto a tokio runtime: each notification becomes a spawned task.
pub struct TokioNotifier<N> {
    inner: Arc<N>,
    handle: Handle,
}

impl<N: AsyncNotificationSink> TokioNotifier<N> {
    /// Create a notifier spawning onto `handle`.
    pub fn new(handle: Handle, inner: N) -> Self {
        Self {
            inner: Arc::new(inner),
            handle,
        }
    }

    /// Create a notifier on the runtime of the calling context, if any.
    pub fn current(inner: N) -> Option<Self> {
        Handle::try_current().ok().map(|handle| Self::new(handle, inner))
    }
}

impl<N: AsyncNotificationSink> NotificationSink for TokioNotifier<N> {
    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        let inner = Arc::clone(&self.inner);
        let notification = notification.clone();
        self.handle.spawn(async move {
            if let Err(e) = inner.deliver(notification).await {
                tracing::warn!(error = %e, "async notification delivery failed");
            }
        });
        Ok(())
    }
}

impl<N> std::fmt::Debug for TokioNotifier<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioNotifier").finish_non_exhaustive()
    }
}
