use crate::common::{self, ScriptedTransport, Step};
use fiscal_api_rs::{ApiError, ApiOptions, ErrorKind, FnInterceptor};
use serde_json::{Value, json};

#[tokio::test]
async fn request_interceptors_run_in_registration_order() {
    let transport = ScriptedTransport::new([Step::Ok(json!({}))]);
    let client = common::scripted_client(transport.clone());

    client
        .add_interceptor(FnInterceptor::new().on_request(|mut req| {
            req.headers.insert("x-trace", "first".parse().unwrap());
            Ok(req)
        }))
        .await;
    client
        .add_interceptor(FnInterceptor::new().on_request(|mut req| {
            let seen = req.headers.get("x-trace").cloned();
            if let Some(v) = seen {
                req.headers.insert("x-seen", v);
            }
            req.headers.insert("x-trace", "second".parse().unwrap());
            Ok(req)
        }))
        .await;

    client
        .api_call_value("/api/v1/api/documents", ApiOptions::get())
        .await
        .unwrap();

    let req = &transport.requests()[0];
    assert_eq!(req.headers["x-seen"], "first");
    assert_eq!(req.headers["x-trace"], "second");
}

#[tokio::test]
async fn response_interceptors_transform_the_result() {
    let transport = ScriptedTransport::new([Step::Ok(json!({"items": [1, 2]}))]);
    let client = common::scripted_client(transport);

    client
        .add_interceptor(FnInterceptor::new().on_response(|v| Ok(json!({"wrapped": v}))))
        .await;
    client
        .add_interceptor(FnInterceptor::new().on_response(|mut v| {
            v["seen"] = Value::Bool(true);
            Ok(v)
        }))
        .await;

    let value = client
        .api_call_value("/api/v1/api/documents", ApiOptions::get())
        .await
        .unwrap();

    assert_eq!(value, json!({"wrapped": {"items": [1, 2]}, "seen": true}));
}

#[tokio::test]
async fn failing_request_interceptor_aborts_without_sending() {
    let transport = ScriptedTransport::new([Step::Ok(json!({}))]);
    let client = common::scripted_client(transport.clone());

    client
        .add_interceptor(FnInterceptor::new().on_request(|_| {
            Err(ApiError::from_kind(401, ErrorKind::AuthenticationError))
        }))
        .await;

    let err = client
        .api_call_value("/api/v1/api/documents", ApiOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthenticationError);
    assert_eq!(transport.calls(), 0);
    let records = client.metrics().records();
    assert_eq!(records[0].status, 401);
    assert_eq!(records[0].retry_count, 0);
}

#[tokio::test]
async fn error_interceptors_can_rewrite_the_failure() {
    let transport = ScriptedTransport::new([Step::Status(404, None)]);
    let client = common::scripted_client(transport);

    client
        .add_interceptor(FnInterceptor::new().on_error(|e| {
            Ok(ApiError::new(e.status(), e.kind(), "Documento não encontrado"))
        }))
        .await;

    let err = client
        .api_call_value("/api/v1/api/documents/9", ApiOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert_eq!(err.message(), "Documento não encontrado");
}

#[tokio::test]
async fn rejected_response_takes_the_failure_path() {
    let transport = ScriptedTransport::new([Step::Ok(json!({"ok": false}))]);
    let client = common::scripted_client(transport.clone());

    client
        .add_interceptor(FnInterceptor::new().on_response(|v| {
            if v["ok"] == json!(false) {
                Err(ApiError::new(422, ErrorKind::ValidationError, "rejected"))
            } else {
                Ok(v)
            }
        }))
        .await;

    let err = client
        .api_call_value("/api/v1/api/documents", ApiOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert_eq!(transport.calls(), 1);
    assert_eq!(client.metrics().records()[0].status, 422);
}
