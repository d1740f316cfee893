pub mod client;
pub mod exceptions;

pub use client::{ClientStats, DeliveryStats, HttpTrackerClient};

use crate::record::Notification;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Failure delivering one notification to the tracker.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Tracker returned HTTP {status}")]
    Http { status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Delivery worker is no longer running")]
    Closed,
}

/// Completion hook for one delivery. Receives the delivery outcome; the relay
/// registers a no-op by default and passes nothing at all when delivery
/// failures are allowed to propagate.
pub type DeliveryCallback = Box<dyn FnOnce(Result<(), DeliveryError>) + Send + 'static>;

/// Remote error-tracking collaborator.
///
/// `notify` is fire-and-forget from the caller's perspective: submission
/// order is FIFO, completion arrives later through the optional callback.
/// `handle_exceptions` installs a process-wide uncaught-panic hook.
#[cfg_attr(test, automock)]
pub trait TrackerClient: Send + Sync {
    fn notify(&self, notification: Notification, on_delivery: Option<DeliveryCallback>);
    fn handle_exceptions(&self);
}
