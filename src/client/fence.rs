//! Discarding stale responses.

use std::sync::atomic::{AtomicU64, Ordering};

/// Issues increasing tickets so only the latest of several overlapping
/// requests is applied.
///
/// A screen that re-queries on every filter change takes a ticket before
/// each call and drops the result if a newer ticket was issued meanwhile.
///
/// ```
/// use adminpanel_rs::RequestFence;
///
/// let fence = RequestFence::new();
/// let first = fence.issue();
/// let second = fence.issue();
/// assert!(!fence.is_current(first));
/// assert!(fence.is_current(second));
/// assert_eq!(fence.accept(second, "rows"), Some("rows"));
/// ```
#[derive(Debug, Default)]
pub struct RequestFence {
    latest: AtomicU64,
}

impl RequestFence {
    /// Create a fence with no tickets issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a new ticket, invalidating all earlier ones.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns `true` if no ticket was issued after `ticket`.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::Acquire) == ticket
    }

    /// Keep `value` only if `ticket` is still current.
    pub fn accept<T>(&self, ticket: u64, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}
