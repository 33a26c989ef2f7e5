//! RelayService — forwards one upload to the OCR upstream and normalizes the
//! outcome into a `RelayResult`.
//!
//! The flow is linear: validate presence, send once, classify. There is no
//! retry and no state shared between calls; the only suspension point is the
//! upstream future, which is dropped when the timeout fires.

use crate::{
    config::RelayConfig,
    models::{
        relay::{RelayRequest, RelayResult},
        upload::UploadedFile,
    },
    services::upstream::{TransportError, Upstream, UpstreamOutcome, timeout_message},
};
use bytes::Bytes;
use serde_json::Value;
use std::time::Instant;
use tokio::time;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Relay `upload` to the configured upstream and produce the single outcome.
///
/// Every log line of one call carries the same `relay_id`.
pub async fn relay(
    upload: Option<UploadedFile>,
    config: &RelayConfig,
    upstream: &dyn Upstream,
) -> RelayResult {
    let span = info_span!("relay", relay_id = %Uuid::new_v4());
    relay_once(upload, config, upstream).instrument(span).await
}

async fn relay_once(
    upload: Option<UploadedFile>,
    config: &RelayConfig,
    upstream: &dyn Upstream,
) -> RelayResult {
    let Some(file) = upload else {
        warn!("rejecting OCR request without a file");
        return RelayResult::LocalValidationError("No file uploaded".into());
    };

    let filename = file.filename.clone();
    let size = file.size();
    let request = RelayRequest {
        file,
        url: config.upstream_url.clone(),
        timeout: config.timeout,
    };
    let deadline_message = timeout_message(&request);

    info!(%filename, size, url = %request.url, "relaying upload to OCR service");
    let started = Instant::now();

    let outcome = match time::timeout(config.timeout, upstream.send(request)).await {
        Ok(outcome) => outcome,
        Err(_) => UpstreamOutcome::Failed(TransportError::Timeout(deadline_message)),
    };
    let result = classify(outcome);

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = result.status().as_u16();
    match &result {
        RelayResult::Success(_) => {
            info!(%filename, size, status, elapsed_ms, "OCR processing completed");
        }
        RelayResult::Internal(details) => {
            error!(%filename, status, elapsed_ms, %details, "relay failed locally");
        }
        other => {
            warn!(%filename, status, elapsed_ms, kind = other.kind(), "relay failed");
        }
    }

    result
}

/// Map a transport outcome to the relay result. Pure.
pub fn classify(outcome: UpstreamOutcome) -> RelayResult {
    match outcome {
        UpstreamOutcome::Responded { status, body } if status.is_success() => {
            RelayResult::Success(decode_body(&body).unwrap_or(Value::Null))
        }
        UpstreamOutcome::Responded { status, body } => {
            let details = decode_body(&body).unwrap_or_else(|| {
                Value::String(format!(
                    "Request failed with status code {}",
                    status.as_u16()
                ))
            });
            RelayResult::UpstreamError { status, details }
        }
        UpstreamOutcome::Failed(TransportError::Timeout(msg)) => RelayResult::Timeout(msg),
        UpstreamOutcome::Failed(TransportError::Connect(msg)) => RelayResult::NetworkError(msg),
        UpstreamOutcome::Failed(TransportError::Setup(msg)) => RelayResult::Internal(msg),
    }
}

/// JSON when the body parses, otherwise the raw text. `None` for an empty body.
fn decode_body(body: &Bytes) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    /// Answers every call with the same canned outcome after an optional delay.
    struct FakeUpstream {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        status: StatusCode,
        body: &'static str,
    }

    impl FakeUpstream {
        fn answering(status: StatusCode, body: &'static str) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
                status,
                body,
            }
        }
    }

    #[async_trait]
    impl Upstream for FakeUpstream {
        async fn send(&self, request: RelayRequest) -> UpstreamOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.file.filename, "receipt.jpg");
            assert_eq!(request.file.content_type, "image/jpeg");
            tokio::time::sleep(self.delay).await;
            UpstreamOutcome::Responded {
                status: self.status,
                body: Bytes::from_static(self.body.as_bytes()),
            }
        }
    }

    fn config(timeout: Duration) -> RelayConfig {
        RelayConfig {
            upstream_url: "http://ocr.test/scan".into(),
            timeout,
            max_file_size: 1024,
        }
    }

    fn upload() -> Option<UploadedFile> {
        Some(UploadedFile::new(
            "receipt.jpg",
            "image/jpeg",
            &b"jpeg-bytes"[..],
        ))
    }

    #[tokio::test]
    async fn test_missing_upload_makes_no_call() {
        let upstream = FakeUpstream::answering(StatusCode::OK, "{}");
        let result = relay(None, &config(Duration::from_secs(1)), &upstream).await;

        assert_eq!(
            result,
            RelayResult::LocalValidationError("No file uploaded".into())
        );
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_passes_payload_through() {
        let upstream = FakeUpstream::answering(StatusCode::OK, r#"{"amount": 100}"#);
        let result = relay(upload(), &config(Duration::from_secs(1)), &upstream).await;

        assert_eq!(result, RelayResult::Success(json!({"amount": 100})));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_upstream_reports_timeout() {
        let mut upstream = FakeUpstream::answering(StatusCode::OK, r#"{"amount": 100}"#);
        upstream.delay = Duration::from_millis(100);

        let result = relay(upload(), &config(Duration::from_millis(30)), &upstream).await;

        assert_eq!(
            result,
            RelayResult::Timeout("timeout of 30ms exceeded".into())
        );
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_status_and_body() {
        let upstream =
            FakeUpstream::answering(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail": "bad image"}"#);
        let result = relay(upload(), &config(Duration::from_secs(1)), &upstream).await;

        assert_eq!(
            result,
            RelayResult::UpstreamError {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                details: json!({"detail": "bad image"}),
            }
        );
    }

    #[test]
    fn test_classify_any_2xx_is_success() {
        let result = classify(UpstreamOutcome::Responded {
            status: StatusCode::CREATED,
            body: Bytes::from_static(b"[1,2]"),
        });
        assert_eq!(result, RelayResult::Success(json!([1, 2])));
    }

    #[test]
    fn test_classify_empty_bodies() {
        assert_eq!(
            classify(UpstreamOutcome::Responded {
                status: StatusCode::OK,
                body: Bytes::new(),
            }),
            RelayResult::Success(Value::Null)
        );
        assert_eq!(
            classify(UpstreamOutcome::Responded {
                status: StatusCode::BAD_GATEWAY,
                body: Bytes::from_static(b"  "),
            }),
            RelayResult::UpstreamError {
                status: StatusCode::BAD_GATEWAY,
                details: json!("Request failed with status code 502"),
            }
        );
    }

    #[test]
    fn test_classify_non_json_body_is_text() {
        let result = classify(UpstreamOutcome::Responded {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: Bytes::from_static(b"<html>oops</html>"),
        });
        assert_eq!(
            result,
            RelayResult::UpstreamError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                details: json!("<html>oops</html>"),
            }
        );
    }

    #[test]
    fn test_classify_transport_failures() {
        assert_eq!(
            classify(UpstreamOutcome::Failed(TransportError::Timeout("t".into()))),
            RelayResult::Timeout("t".into())
        );
        assert_eq!(
            classify(UpstreamOutcome::Failed(TransportError::Connect(
                "dns error".into()
            ))),
            RelayResult::NetworkError("dns error".into())
        );
        assert_eq!(
            classify(UpstreamOutcome::Failed(TransportError::Setup("bad".into()))),
            RelayResult::Internal("bad".into())
        );
    }
}
