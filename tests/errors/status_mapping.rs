use crate::common;
use fiscal_api_rs::{ApiOptions, ErrorKind};
use httpmock::Method::GET;

#[tokio::test]
async fn http_404_maps_to_not_found_without_retry() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/api/documents/missing");
        then.status(404)
            .header("content-type", "application/json")
            .body("{}");
    });

    let client = common::client_for(&server);
    let err = client
        .api_call_value("/api/v1/api/documents/missing", ApiOptions::get())
        .await
        .unwrap_err();

    // 404 is not retryable: exactly one request.
    mock.assert();

    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert_eq!(err.status(), 404);
    let url = err.detail("url").and_then(|v| v.as_str()).unwrap();
    assert!(url.contains("/api/v1/api/documents/missing"));
}

#[tokio::test]
async fn http_503_retries_then_surfaces_service_unavailable() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/api/system/status");
        then.status(503).body("Service Unavailable");
    });

    let client = common::client_for(&server);
    let err = client
        .api_call_value("/api/v1/api/system/status", ApiOptions::get().retry(2))
        .await
        .unwrap_err();

    // 1 initial + 2 retries
    mock.assert_calls(3);
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert_eq!(err.status(), 503);
}

#[tokio::test]
async fn server_supplied_code_wins_over_status_table() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/api/nl/query");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"codigo_erro":"AGENT_PROCESSING_ERROR","mensagem":"Agente falhou"}"#);
    });

    let client = common::client_for(&server);
    let err = client
        .api_call_value("/api/v1/api/nl/query", ApiOptions::get())
        .await
        .unwrap_err();

    mock.assert();
    assert_eq!(err.kind(), ErrorKind::AgentProcessingError);
    assert_eq!(err.message(), "Agente falhou");
}
