use super::{DeliveryCallback, DeliveryError, TrackerClient};
use crate::config::{ConfigError, RelayConfig};
use crate::record::Notification;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, warn};
use url::Url;

const API_KEY_HEADER: &str = "x-api-key";

/// Atomic delivery counters, shared with the worker task.
#[derive(Debug, Default)]
pub struct ClientStats {
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl ClientStats {
    fn record(&self, success: bool) {
        if success {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

struct Delivery {
    notification: Notification,
    on_delivery: Option<DeliveryCallback>,
}

/// Envelope posted to the tracker for each notification.
#[derive(Serialize)]
struct NoticeEnvelope<'a> {
    notifier: Notifier,
    environment: Option<&'a str>,
    notice: &'a Notification,
}

#[derive(Serialize)]
struct Notifier {
    name: &'static str,
    version: &'static str,
}

struct Inner {
    tx: UnboundedSender<Delivery>,
    stats: Arc<ClientStats>,
    stack_trace_limit: usize,
    hook_installed: AtomicBool,
    reporting_panic: AtomicBool,
}

/// HTTP implementation of the tracker collaborator.
///
/// Deliveries go through a single worker task fed by an unbounded channel, so
/// `notify` never blocks and submission order is FIFO. Completion order is
/// not guaranteed beyond the single worker's sequencing.
#[derive(Clone)]
pub struct HttpTrackerClient {
    inner: Arc<Inner>,
}

impl HttpTrackerClient {
    /// Validate the endpoint, build the pooled HTTP client, and spawn the
    /// delivery worker. Must be called within a Tokio runtime.
    pub fn create(config: &RelayConfig) -> Result<Self, ConfigError> {
        let notify_url: Url = config.endpoint.parse().map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", config.endpoint, e))
        })?;

        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(config.max_connections)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ConfigError::InvalidConfig(format!("Failed to build HTTP client: {e}"))
            })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(ClientStats::default());

        tokio::spawn(run_delivery_worker(
            rx,
            http,
            notify_url,
            config.api_key.clone(),
            config.environment.clone(),
            stats.clone(),
        ));

        Ok(Self {
            inner: Arc::new(Inner {
                tx,
                stats: stats.clone(),
                stack_trace_limit: config.stack_trace_limit,
                hook_installed: AtomicBool::new(false),
                reporting_panic: AtomicBool::new(false),
            }),
        })
    }

    pub fn stats(&self) -> DeliveryStats {
        self.inner.stats.snapshot()
    }

    pub(crate) fn stack_trace_limit(&self) -> usize {
        self.inner.stack_trace_limit
    }

    /// Submit a panic notification from inside the panic hook. Guarded so a
    /// panic raised while reporting a panic cannot loop.
    pub(crate) fn submit_panic_notification(&self, notification: Notification) {
        if self.inner.reporting_panic.swap(true, Ordering::SeqCst) {
            return;
        }
        // No-op callback: a failed panic report must not take down the worker
        self.submit(notification, Some(Box::new(|_| {})));
        self.inner.reporting_panic.store(false, Ordering::SeqCst);
    }

    fn submit(&self, notification: Notification, on_delivery: Option<DeliveryCallback>) {
        let delivery = Delivery {
            notification,
            on_delivery,
        };
        if let Err(mpsc::error::SendError(delivery)) = self.inner.tx.send(delivery) {
            error!("delivery worker is gone; dropping notification {}", delivery.notification.id);
            if let Some(callback) = delivery.on_delivery {
                callback(Err(DeliveryError::Closed));
            }
        }
    }
}

impl TrackerClient for HttpTrackerClient {
    fn notify(&self, notification: Notification, on_delivery: Option<DeliveryCallback>) {
        self.submit(notification, on_delivery);
    }

    fn handle_exceptions(&self) {
        // Install-once: repeated setup calls must not stack hooks
        if self.inner.hook_installed.swap(true, Ordering::SeqCst) {
            return;
        }
        super::exceptions::install_panic_hook(self.clone());
        debug!("uncaught-panic reporting hook installed");
    }
}

async fn run_delivery_worker(
    mut rx: UnboundedReceiver<Delivery>,
    http: Client,
    notify_url: Url,
    api_key: String,
    environment: Option<String>,
    stats: Arc<ClientStats>,
) {
    debug!("delivery worker started for {notify_url}");

    while let Some(delivery) = rx.recv().await {
        let id = delivery.notification.id;
        let result = deliver(
            &http,
            &notify_url,
            &api_key,
            environment.as_deref(),
            &delivery.notification,
        )
        .await;
        stats.record(result.is_ok());

        match (result, delivery.on_delivery) {
            (Ok(()), Some(callback)) => callback(Ok(())),
            (Ok(()), None) => {}
            (Err(e), Some(callback)) => {
                warn!("failed to deliver notification {id}: {e}");
                callback(Err(e));
            }
            (Err(e), None) => {
                // No callback registered: the failure propagates unhandled.
                // Deployments wanting crash-on-delivery-failure run with
                // panic = "abort".
                error!("failed to deliver notification {id} with no completion hook: {e}");
                panic!("errgate: notification delivery failed: {e}");
            }
        }
    }

    debug!("delivery worker stopped");
}

async fn deliver(
    http: &Client,
    notify_url: &Url,
    api_key: &str,
    environment: Option<&str>,
    notification: &Notification,
) -> Result<(), DeliveryError> {
    let envelope = NoticeEnvelope {
        notifier: Notifier {
            name: "errgate",
            version: crate::VERSION,
        },
        environment,
        notice: notification,
    };

    let response = http
        .post(notify_url.clone())
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .header(API_KEY_HEADER, api_key)
        .json(&envelope)
        .send()
        .await
        .map_err(|e| DeliveryError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        debug!(
            "delivered notification {} ({})",
            notification.id, notification.severity
        );
        Ok(())
    } else {
        Err(DeliveryError::Http {
            status: status.as_u16(),
        })
    }
}
