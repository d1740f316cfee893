use crate::record::Notification;
use crate::tracker::{DeliveryCallback, TrackerClient};
use std::sync::Arc;
use tracing::debug;

/// Hands accepted notifications to the tracker collaborator.
///
/// When delivery failures are allowed to propagate no completion callback is
/// registered; otherwise a no-op callback is passed as the hook point that
/// keeps failures from escaping.
pub struct Dispatcher {
    client: Arc<dyn TrackerClient>,
    allow_delivery_to_fail: bool,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn TrackerClient>, allow_delivery_to_fail: bool) -> Self {
        Self {
            client,
            allow_delivery_to_fail,
        }
    }

    /// Fire-and-forget handoff; ownership of the notification moves to the
    /// collaborator.
    pub fn dispatch(&self, notification: Notification) {
        debug!(
            "dispatching notification {} ({}/{})",
            notification.id, notification.component, notification.severity
        );

        let on_delivery: Option<DeliveryCallback> = if self.allow_delivery_to_fail {
            None
        } else {
            Some(Box::new(|_| {}))
        };
        self.client.notify(notification, on_delivery);
    }
}
