pub mod dispatch;

pub use dispatch::Dispatcher;

use crate::config::RelayConfig;
use crate::domain::severity::SeverityMap;
use crate::domain::value::LogCall;
use crate::domain::RelayError;
use crate::record::{normalize, Notification, NotificationBuilder};
use crate::tracker::{HttpTrackerClient, TrackerClient};
use std::collections::VecDeque;
use std::sync::Arc;

/// A composable unit in a log-processing pipeline. Stages observe every call
/// and never mutate or filter what flows past them.
pub trait PipelineStage: Send {
    /// Stage name, for composition and diagnostics
    fn name(&self) -> &'static str;

    /// Handle one log call
    fn write(&mut self, call: &LogCall) -> Result<(), RelayError>;

    /// Drain any buffered work at shutdown
    fn end(&mut self) -> Result<(), RelayError>;
}

/// Ordered chain of stages. Every stage receives the same unmodified call,
/// so records pass through regardless of what any one stage does with them.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: Box<dyn PipelineStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn write(&mut self, call: &LogCall) -> Result<(), RelayError> {
        for stage in &mut self.stages {
            stage.write(call)?;
        }
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), RelayError> {
        for stage in &mut self.stages {
            stage.end()?;
        }
        Ok(())
    }
}

/// The severity-gated relay stage: log calls at or above the configured
/// threshold become notifications for the error tracker, everything flows
/// through the pipeline untouched.
pub struct ErrorRelayStage {
    severity: SeverityMap,
    threshold: u32,
    stack_trace_limit: usize,
    pending: VecDeque<Notification>,
    dispatcher: Dispatcher,
}

impl ErrorRelayStage {
    /// Validate the configuration, create the HTTP tracker client, and
    /// install the panic hook unless disabled. Fails fast (not retried) when
    /// the api key is missing.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        config.validate().map_err(RelayError::Config)?;
        let client = Arc::new(HttpTrackerClient::create(&config)?);
        Self::with_client(config, client)
    }

    /// Same setup against any tracker collaborator.
    pub fn with_client(
        config: RelayConfig,
        client: Arc<dyn TrackerClient>,
    ) -> Result<Self, RelayError> {
        config.validate().map_err(RelayError::Config)?;

        if config.handle_exceptions {
            client.handle_exceptions();
        }

        let severity = SeverityMap::with_custom_levels(&config.custom_levels);
        let threshold = config.error_threshold.resolve(&severity);
        let dispatcher = Dispatcher::new(client, config.allow_delivery_to_fail);

        Ok(Self {
            severity,
            threshold,
            stack_trace_limit: config.stack_trace_limit,
            pending: VecDeque::new(),
            dispatcher,
        })
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn flush_one(&mut self) {
        if let Some(notification) = self.pending.pop_front() {
            self.dispatcher.dispatch(notification);
        }
    }
}

impl PipelineStage for ErrorRelayStage {
    fn name(&self) -> &'static str {
        "error-relay"
    }

    fn write(&mut self, call: &LogCall) -> Result<(), RelayError> {
        if self.severity.should_report(&call.level, self.threshold) {
            let record = normalize(call.args.clone());
            let notification = NotificationBuilder::new(call.component.as_str(), call.level.as_str())
                .build(record, self.stack_trace_limit)?;
            self.pending.push_back(notification);
            self.flush_one();
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), RelayError> {
        // One notification per step; re-check the queue each time since the
        // collaborator's send may complete synchronously or not
        while !self.pending.is_empty() {
            self.flush_one();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::MockTrackerClient;

    fn config() -> RelayConfig {
        RelayConfig {
            handle_exceptions: false,
            ..RelayConfig::new("test")
        }
    }

    fn mock_expecting_notifies(count: usize) -> MockTrackerClient {
        let mut client = MockTrackerClient::new();
        client.expect_notify().times(count).return_const(());
        client
    }

    fn queued(message: &str) -> Notification {
        NotificationBuilder::new("name", "error")
            .build(normalize(vec![message.into()]), 20)
            .unwrap()
    }

    #[test]
    fn end_drains_every_pending_notification() {
        let client = mock_expecting_notifies(3);
        let mut stage = ErrorRelayStage::with_client(config(), Arc::new(client)).unwrap();

        stage.pending.push_back(queued("first"));
        stage.pending.push_back(queued("second"));
        stage.pending.push_back(queued("third"));

        stage.end().unwrap();
        assert_eq!(stage.pending_len(), 0);
    }

    #[test]
    fn end_on_an_empty_queue_sends_nothing() {
        let client = mock_expecting_notifies(0);
        let mut stage = ErrorRelayStage::with_client(config(), Arc::new(client)).unwrap();
        stage.end().unwrap();
    }

    #[test]
    fn notifications_drain_in_fifo_order() {
        let mut client = MockTrackerClient::new();
        let mut expected = vec!["first".to_string(), "second".to_string()];
        expected.reverse();
        client
            .expect_notify()
            .times(2)
            .returning(move |notification, _| {
                assert_eq!(Some(notification.message), expected.pop());
            });

        let mut stage = ErrorRelayStage::with_client(config(), Arc::new(client)).unwrap();
        stage.pending.push_back(queued("first"));
        stage.pending.push_back(queued("second"));
        stage.end().unwrap();
    }

    #[test]
    fn installs_the_exception_hook_by_default() {
        let mut client = MockTrackerClient::new();
        client.expect_handle_exceptions().times(1).return_const(());

        let config = RelayConfig::new("test");
        assert!(config.handle_exceptions);
        ErrorRelayStage::with_client(config, Arc::new(client)).unwrap();
    }

    #[test]
    fn skips_the_exception_hook_when_disabled() {
        let mut client = MockTrackerClient::new();
        client.expect_handle_exceptions().times(0);

        ErrorRelayStage::with_client(config(), Arc::new(client)).unwrap();
    }

    #[test]
    fn construction_fails_without_an_api_key() {
        let client = MockTrackerClient::new();
        let result = ErrorRelayStage::with_client(RelayConfig::default(), Arc::new(client));
        assert!(matches!(
            result,
            Err(RelayError::Config(crate::config::ConfigError::MissingApiKey))
        ));
    }
}
