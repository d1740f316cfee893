use errgate::tracker::{HttpTrackerClient, TrackerClient};
use errgate::RelayConfig;
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// The panic hook is process-global, so this binary holds the single test that
// installs it. Do not add further #[tokio::test] functions here: a second
// test would race on the hook.
#[tokio::test]
async fn uncaught_panics_reach_the_tracker_and_the_previous_hook_still_runs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/notices"))
        .and(header("x-api-key", "secret-key"))
        .and(body_string_contains("\"component\":\"panic\""))
        .and(body_string_contains("\"message\":\"payment worker exploded\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = RelayConfig {
        endpoint: format!("{}/v1/notices", server.uri()),
        ..RelayConfig::new("secret-key")
    };
    let client = HttpTrackerClient::create(&config).unwrap();

    let previous_hook_calls = Arc::new(AtomicUsize::new(0));
    let calls = previous_hook_calls.clone();
    panic::set_hook(Box::new(move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
    }));

    client.handle_exceptions();
    // Repeated setup must not stack a second hook (each stacked hook would
    // submit its own notification and break the expect(1) above)
    client.handle_exceptions();

    let caught = panic::catch_unwind(|| panic!("payment worker exploded"));
    assert!(caught.is_err());

    // Restore the default hook so later panics print normally
    let _ = panic::take_hook();

    assert_eq!(previous_hook_calls.load(Ordering::SeqCst), 1);

    // Delivery is fire-and-forget; poll until the worker has flushed
    for _ in 0..50 {
        if !server.received_requests().await.unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body = String::from_utf8_lossy(&requests[0].body).into_owned();
    assert!(body.contains("\"severity\":\"error\""));
    // The panic location rides along in the payload
    assert!(body.contains("exceptions_test.rs"));
}
