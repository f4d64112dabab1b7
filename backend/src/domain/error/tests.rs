//! Tests for error construction and wire format.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn trace_id() -> TraceId {
    TRACE_ID.parse().expect("fixture provides a valid UUID")
}

#[rstest]
fn try_new_rejects_blank_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert_eq!(result, Err(ErrorValidationError::EmptyMessage));
}

#[rstest]
#[case(ErrorCode::InternalError, "Internal server error")]
#[case(ErrorCode::UpstreamTimeout, "Generation failed")]
fn new_substitutes_blank_messages(#[case] code: ErrorCode, #[case] expected: &str) {
    assert_eq!(Error::new(code, "").message(), expected);
}

#[rstest]
fn try_with_trace_id_rejects_blank_values() {
    let result = Error::invalid_request("bad").try_with_trace_id(" ");
    assert_eq!(result, Err(ErrorValidationError::EmptyTraceId));
}

#[rstest]
fn new_has_no_trace_id_out_of_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(trace_id: TraceId) {
    let error = TraceId::scope(trace_id, async { Error::forbidden("nope") }).await;
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn serialises_cause_under_error_key() {
    let error = Error::new(ErrorCode::UpstreamUnavailable, "Generation failed")
        .with_cause("connection refused")
        .with_details(json!({ "status": 502 }))
        .with_trace_id(TRACE_ID);

    let value = serde_json::to_value(&error).expect("serialise");

    assert_eq!(
        value,
        json!({
            "code": "upstream_unavailable",
            "message": "Generation failed",
            "error": "connection refused",
            "traceId": TRACE_ID,
            "details": { "status": 502 },
        })
    );
}

#[rstest]
fn error_key_falls_back_to_code() {
    let value = serde_json::to_value(Error::insufficient_credits("Insufficient credits"))
        .expect("serialise");
    assert_eq!(value["error"], json!("insufficient_credits"));
    assert!(value.get("traceId").is_none());
    assert!(value.get("details").is_none());
}

#[rstest]
fn deserialising_code_fallback_leaves_cause_empty() {
    let error: Error = serde_json::from_value(json!({
        "code": "not_found",
        "message": "missing",
        "error": "not_found",
    }))
    .expect("deserialise");
    assert_eq!(error.cause(), None);
}

#[rstest]
#[tokio::test]
async fn deserialising_ignores_ambient_trace(trace_id: TraceId) {
    let payload = json!({ "code": "invalid_request", "message": "bad" });
    let error = TraceId::scope(trace_id, async move {
        serde_json::from_value::<Error>(payload).expect("deserialise")
    })
    .await;
    assert!(error.trace_id().is_none());
}

#[rstest]
fn deserialising_blank_message_fails() {
    let result = serde_json::from_value::<Error>(json!({ "code": "forbidden", "message": "" }));
    assert!(result.is_err());
}

#[rstest]
fn display_includes_cause() {
    let error = Error::internal("Generation failed").with_cause("disk full");
    assert_eq!(error.to_string(), "Generation failed: disk full");
}
