use fiscal_api_rs::core::cache::{cache_key, is_cacheable};
use reqwest::Method;
use std::collections::BTreeMap;

#[test]
fn key_is_method_endpoint_and_sorted_query() {
    let mut query = BTreeMap::new();
    query.insert("limit".to_string(), "10".to_string());
    query.insert("hours".to_string(), "24".to_string());

    assert_eq!(
        cache_key(&Method::GET, "/api/v1/api/activity/recent", &query),
        r#"GET:/api/v1/api/activity/recent:{"hours":"24","limit":"10"}"#
    );
}

#[test]
fn empty_query_serializes_as_empty_object() {
    assert_eq!(
        cache_key(&Method::GET, "/x", &BTreeMap::new()),
        "GET:/x:{}"
    );
}

#[test]
fn only_safe_methods_are_cacheable() {
    assert!(is_cacheable(&Method::GET));
    assert!(is_cacheable(&Method::HEAD));
    for m in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
        assert!(!is_cacheable(&m), "{m}");
    }
}
