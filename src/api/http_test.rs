use super::*;
use crate::config::{ClientConfig, ClientTimeouts};

fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_owned(),
        refresh_interval_secs: 60,
        timeouts: ClientTimeouts { request_secs: 5, connect_secs: 1 },
    }
}

#[test]
fn parse_body_success() {
    let reply: ChatReply = parse_body(200, r#"{"response":"hi","reasoning":["a","b"]}"#).unwrap();
    assert_eq!(reply.response, "hi");
    assert_eq!(reply.reasoning, Some(vec!["a".to_owned(), "b".to_owned()]));
}

#[test]
fn parse_body_non_success_status() {
    let err = parse_body::<HealthStatus>(500, "Internal Server Error").unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, ref body } if body == "Internal Server Error"));
    assert_eq!(err.code(), "E_STATUS");
}

#[test]
fn parse_body_created_counts_as_success() {
    let health: HealthStatus = parse_body(201, r#"{"status":"operational"}"#).unwrap();
    assert_eq!(health.status, "operational");
}

#[test]
fn parse_body_invalid_json() {
    let err = parse_body::<ChatReply>(200, "not json").unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[test]
fn parse_body_missing_required_chat_field() {
    let err = parse_body::<ChatReply>(200, r#"{"reasoning":[]}"#).unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[test]
fn url_joins_base_and_path() {
    let api = HttpPlantApi::new(&test_config("http://plant.test")).unwrap();
    assert_eq!(api.base_url(), "http://plant.test");
    assert_eq!(api.url("/api/chat"), "http://plant.test/api/chat");
}
