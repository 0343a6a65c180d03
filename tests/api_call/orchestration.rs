use crate::common::{self, ScriptedTransport, Step};
use fiscal_api_rs::{ApiOptions, ErrorKind};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn transient_failures_then_success_is_cached() {
    let transport = ScriptedTransport::new([
        Step::Status(503, None),
        Step::Status(503, None),
        Step::Ok(json!({"status": "healthy"})),
    ]);
    let client = common::scripted_client(transport.clone());
    let opts = || ApiOptions::get().retry(3).cached(Duration::from_secs(60));

    let first = client
        .api_call_value("/api/v1/api/system/status", opts())
        .await
        .unwrap();
    assert_eq!(first, json!({"status": "healthy"}));
    assert_eq!(transport.calls(), 3);

    let second = client
        .api_call_value("/api/v1/api/system/status", opts())
        .await
        .unwrap();
    assert_eq!(second, first);
    assert_eq!(transport.calls(), 3);

    let records = client.metrics().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].retry_count, 2);
    assert_eq!(records[0].status, 200);
    assert!(!records[0].cache_hit);
    assert!(records[1].cache_hit);
}

#[tokio::test]
async fn exhausted_retries_record_the_failure() {
    let transport = ScriptedTransport::new([Step::Status(500, None)]);
    let client = common::scripted_client(transport.clone());

    let err = client
        .api_call_value("/api/v1/api/documents", ApiOptions::get().retry(2))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(transport.calls(), 3);

    let records = client.metrics().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, 500);
    assert_eq!(records[0].retry_count, 2);
    assert_eq!(records[0].method, "GET");
    assert_eq!(records[0].endpoint, "/api/v1/api/documents");

    let perf = client.performance_data();
    assert_eq!(perf.total_requests, 1);
    assert_eq!(perf.error_rate, 1.0);
    assert_eq!(perf.slowest_endpoints[0].endpoint, "GET /api/v1/api/documents");
}

#[tokio::test]
async fn defaults_are_get_three_retries_and_thirty_seconds() {
    let transport = ScriptedTransport::new([Step::Status(502, None)]);
    let client = common::scripted_client(transport.clone());

    let _ = client
        .api_call_value("/api/v1/api/documents", ApiOptions::new())
        .await;

    assert_eq!(transport.calls(), 4);
    let req = &transport.requests()[0];
    assert_eq!(req.method, reqwest::Method::GET);
    assert_eq!(req.timeout, Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn hanging_request_times_out() {
    let transport = ScriptedTransport::new([Step::Hang]);
    let client = common::scripted_client(transport.clone());

    let err = client
        .api_call_value(
            "/api/v1/api/nl/query",
            ApiOptions::get()
                .timeout(Duration::from_millis(50))
                .retry(1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TimeoutError);
    assert_eq!(err.status(), 408);
    // Timeouts are retryable.
    assert_eq!(transport.calls(), 2);
    assert_eq!(client.metrics().records()[0].status, 408);
}

#[derive(Debug, Deserialize, PartialEq)]
struct Metrics {
    total_documents: u64,
}

#[tokio::test]
async fn typed_call_decodes_the_body() {
    let transport = ScriptedTransport::new([Step::Ok(json!({"total_documents": 7, "extra": 1}))]);
    let client = common::scripted_client(transport);

    let m: Metrics = client
        .api_call("/api/v1/api/dashboard/metrics", ApiOptions::get())
        .await
        .unwrap();

    assert_eq!(m, Metrics { total_documents: 7 });
}

#[tokio::test]
async fn shape_mismatch_is_an_unknown_error() {
    let transport = ScriptedTransport::new([Step::Ok(json!({"total_documents": "many"}))]);
    let client = common::scripted_client(transport.clone());

    let err = client
        .api_call::<Metrics>("/api/v1/api/dashboard/metrics", ApiOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnknownError);
    assert_eq!(err.status(), 500);
    // Decoding is not retried.
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn query_and_body_reach_the_transport() {
    let transport = ScriptedTransport::new([Step::Ok(json!({"answer": "42"}))]);
    let client = common::scripted_client(transport.clone());

    client
        .api_call_value(
            "/api/v1/api/nl/query",
            ApiOptions::post(json!({"question": "total?"})).query("lang", "pt"),
        )
        .await
        .unwrap();

    let req = &transport.requests()[0];
    assert_eq!(req.method, reqwest::Method::POST);
    assert_eq!(req.query.get("lang").map(String::as_str), Some("pt"));
    assert_eq!(
        req.body,
        fiscal_api_rs::Body::Json(json!({"question": "total?"}))
    );
}

#[tokio::test]
async fn invalid_header_fails_before_sending() {
    let transport = ScriptedTransport::new([Step::Ok(json!({}))]);
    let client = common::scripted_client(transport.clone());

    for opts in [
        ApiOptions::get().header("bad header", "x"),
        ApiOptions::get().header("authorization", "Bearer a\nb"),
    ] {
        let err = client
            .api_call_value("/api/v1/api/documents", opts)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.status(), 0);
    }

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn valid_headers_are_forwarded() {
    let transport = ScriptedTransport::new([Step::Ok(json!({}))]);
    let client = common::scripted_client(transport.clone());

    client
        .api_call_value(
            "/api/v1/api/documents",
            ApiOptions::get().header("x-request-id", "abc-123"),
        )
        .await
        .unwrap();

    assert_eq!(transport.requests()[0].headers["x-request-id"], "abc-123");
}
