#![deny(warnings)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::missing_errors_doc,      // Internal API
    clippy::missing_panics_doc,      // Internal API
    clippy::module_name_repetitions, // e.g. RelayError in domain module
    clippy::must_use_candidate       // Annotated selectively on critical APIs
)]

pub mod config;
pub mod domain;
pub mod record;
pub mod stage;
pub mod tracker;

// Re-export main types for easy access
pub use config::{ConfigError, RelayConfig};
pub use domain::{ArgValue, CapturedError, LogCall, RelayError, SeverityMap, Threshold};
pub use record::Notification;
pub use stage::{ErrorRelayStage, Pipeline, PipelineStage};
pub use tracker::{DeliveryCallback, DeliveryError, HttpTrackerClient, TrackerClient};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
