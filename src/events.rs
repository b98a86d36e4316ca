//! Application event channels.
//!
//! Components that need to react to client activity (a warnings panel, a
//! navigation guard, a group picker) subscribe to an [`EventBus`] handed to
//! them at construction. Publishing never blocks and never fails when nobody
//! is listening.

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::trace;

use crate::models::ApiWarning;

const CHANNEL_CAPACITY: usize = 64;

/// Shared handles for warnings, sign-in changes and group reloads.
///
/// Cloning is cheap; all clones publish to the same subscribers.
///
/// # Example
///
/// ```
/// use adminpanel_rs::EventBus;
///
/// # async fn example() {
/// let events = EventBus::new();
/// let mut reloads = events.subscribe_group_reload();
/// events.reload_groups();
/// assert!(reloads.recv().await.is_ok());
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

struct EventBusInner {
    warnings: broadcast::Sender<Vec<ApiWarning>>,
    signin: watch::Sender<bool>,
    group_reload: broadcast::Sender<()>,
}

impl EventBus {
    /// Create a bus with no subscribers; the sign-in state starts `false`.
    pub fn new() -> Self {
        let (warnings, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (signin, _) = watch::channel(false);
        let (group_reload, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(EventBusInner {
                warnings,
                signin,
                group_reload,
            }),
        }
    }

    /// Publish the warnings returned by one API call.
    pub fn publish_warnings(&self, warnings: Vec<ApiWarning>) {
        if warnings.is_empty() {
            return;
        }
        let count = warnings.len();
        if self.inner.warnings.send(warnings).is_err() {
            trace!(count, "no subscribers for API warnings");
        }
    }

    /// Receive batches of API warnings, one batch per call.
    pub fn subscribe_warnings(&self) -> broadcast::Receiver<Vec<ApiWarning>> {
        self.inner.warnings.subscribe()
    }

    /// Record a sign-in state change.
    pub fn set_signed_in(&self, signed_in: bool) {
        self.inner.signin.send_replace(signed_in);
    }

    /// Current sign-in state.
    pub fn is_signed_in(&self) -> bool {
        *self.inner.signin.borrow()
    }

    /// Watch the sign-in state.
    pub fn subscribe_signin(&self) -> watch::Receiver<bool> {
        self.inner.signin.subscribe()
    }

    /// Ask group pickers to refetch the user groups list.
    pub fn reload_groups(&self) {
        if self.inner.group_reload.send(()).is_err() {
            trace!("no subscribers for group reloads");
        }
    }

    /// Receive group reload requests.
    pub fn subscribe_group_reload(&self) -> broadcast::Receiver<()> {
        self.inner.group_reload.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("signed_in", &self.is_signed_in())
            .field("warning_subscribers", &self.inner.warnings.receiver_count())
            .finish()
    }
}
