use crate::common::{self, ScriptedTransport, Step};
use fiscal_api_rs::{
    Documents, ErrorKind, PollConfig, PollState, ProcessingStatus, StatusPoller,
};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::Instant;

fn status(s: &str, progress: f64) -> Step {
    Step::Ok(json!({
        "document_id": "doc-1",
        "status": s,
        "progress": progress,
        "current_agent": "fiscal_validator",
        "agents_completed": [],
        "agents_pending": ["classifier"]
    }))
}

fn quick(max_attempts: u32) -> PollConfig {
    PollConfig {
        max_attempts,
        interval: Duration::from_millis(100),
    }
}

#[tokio::test(start_paused = true)]
async fn polls_until_completed() {
    let transport = ScriptedTransport::new([
        status("pending", 0.0),
        status("processing", 50.0),
        status("completed", 100.0),
    ]);
    let client = common::scripted_client(transport.clone());
    let mut poller = StatusPoller::new(&client, "doc-1", quick(10));

    let mut seen = Vec::new();
    let started = Instant::now();
    let done = poller.run(|s| seen.push(s.progress)).await.unwrap();

    assert_eq!(done.status, ProcessingStatus::Completed);
    assert_eq!(seen, [0.0, 50.0, 100.0]);
    assert_eq!(poller.state(), PollState::Completed);
    assert_eq!(poller.attempts(), 3);
    // Two sleeps between three attempts.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(210), "{elapsed:?}");
    assert_eq!(
        transport.requests()[0].endpoint,
        "/api/v1/api/documents/doc-1/status"
    );
}

#[tokio::test(start_paused = true)]
async fn backend_error_status_stops_the_poll() {
    let transport = ScriptedTransport::new([
        status("processing", 10.0),
        Step::Ok(json!({
            "document_id": "doc-1",
            "status": "error",
            "error_message": "XML inválido"
        })),
    ]);
    let client = common::scripted_client(transport);
    let mut poller = StatusPoller::new(&client, "doc-1", quick(10));

    let done = poller.run(|_| {}).await.unwrap();

    assert_eq!(poller.state(), PollState::Error);
    assert_eq!(done.error_message.as_deref(), Some("XML inválido"));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_attempts() {
    let transport = ScriptedTransport::new([status("processing", 10.0)]);
    let client = common::scripted_client(transport.clone());
    let mut poller = StatusPoller::new(&client, "doc-1", quick(3));

    let err = poller.run(|_| {}).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProcessingTimeout);
    assert_eq!(err.status(), 408);
    assert_eq!(err.detail("attempts"), Some(&Value::from(3)));
    assert_eq!(poller.state(), PollState::TimedOut);
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_polls_count_toward_the_limit() {
    let transport = ScriptedTransport::new([Step::Status(404, None)]);
    let client = common::scripted_client(transport.clone());
    let mut poller = StatusPoller::new(&client, "gone", quick(2));

    let err = poller.run(|_| {}).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert_eq!(poller.state(), PollState::TimedOut);
    assert_eq!(poller.attempts(), 2);
    // 404 is not retried inside a poll attempt.
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn transient_failure_does_not_end_the_poll() {
    let transport = ScriptedTransport::new([
        Step::Status(404, None),
        status("completed", 100.0),
    ]);
    let client = common::scripted_client(transport);

    let done = Documents::new(&client)
        .poll_status("doc-1", quick(5), |_| {})
        .await
        .unwrap();

    assert_eq!(done.status, ProcessingStatus::Completed);
}

#[tokio::test]
async fn status_resource_loads_the_document() {
    let transport = ScriptedTransport::new([status("processing", 40.0)]);
    let client = common::scripted_client(transport.clone());

    let resource = Documents::new(&client).status("doc-1");
    let state = resource.settled().await;

    let data = state.data.unwrap();
    assert_eq!(data.status, ProcessingStatus::Processing);
    assert_eq!(data.current_agent.as_deref(), Some("fiscal_validator"));
    assert_eq!(resource.endpoint(), "/api/v1/api/documents/doc-1/status");
}

#[test]
fn default_schedule_is_sixty_attempts_five_seconds_apart() {
    let cfg = PollConfig::default();
    assert_eq!(cfg.max_attempts, 60);
    assert_eq!(cfg.interval, Duration::from_secs(5));
}
