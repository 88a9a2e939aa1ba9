use serde_json::Value;

use portico_core::envelope::{is_success_status, message_for_status, Envelope};

use crate::transport::RawResponse;

/// Backend reply after translation: the original status code plus the
/// envelope the gateway hands to the browser. Every proxy route returns one
/// of these, whatever the backend actually sent.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedResponse {
    pub status: u16,
    pub envelope: Envelope,
}

impl NormalizedResponse {
    pub fn new(status: u16, envelope: Envelope) -> Self {
        NormalizedResponse { status, envelope }
    }
}

/// Translate a raw backend reply into an envelope. JSON bodies pass through
/// [`Envelope::from_json`]; empty and non-JSON bodies become synthetic
/// envelopes carrying the original status code.
pub fn normalize(raw: &RawResponse) -> NormalizedResponse {
    if raw.body.is_empty() {
        let envelope = if is_success_status(raw.status) {
            Envelope::success(Value::Object(serde_json::Map::new()))
        } else {
            Envelope::failure(message_for_status(raw.status))
        };
        return NormalizedResponse::new(raw.status, envelope);
    }

    if let Ok(value) = serde_json::from_slice::<Value>(&raw.body) {
        return NormalizedResponse::new(raw.status, Envelope::from_json(value, raw.status));
    }

    let body_text = String::from_utf8_lossy(&raw.body);
    NormalizedResponse::new(raw.status, non_json_envelope(raw, &body_text))
}

fn non_json_envelope(raw: &RawResponse, body: &str) -> Envelope {
    if looks_like_html(raw, body) {
        if is_deployment_missing(body) {
            return Envelope::failure(format!(
                "The backend deployment could not be found (status {}).",
                raw.status
            ));
        }
        return Envelope::failure(format!(
            "The backend returned an HTML error page instead of JSON (status {}).",
            raw.status
        ));
    }
    Envelope::failure(format!(
        "The backend returned a non-JSON response (status {}).",
        raw.status
    ))
}

fn looks_like_html(raw: &RawResponse, body: &str) -> bool {
    if let Some(content_type) = &raw.content_type {
        if content_type.to_ascii_lowercase().contains("text/html") {
            return true;
        }
    }
    let head = body.trim_start().get(..9).unwrap_or(body.trim_start()).to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

fn is_deployment_missing(body: &str) -> bool {
    if body.contains("DEPLOYMENT_NOT_FOUND") {
        return true;
    }
    let lowered = body.to_ascii_lowercase();
    lowered.contains("deployment not found") || lowered.contains("deployment could not be found")
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::json;

    use crate::transport::RawResponse;

    use super::normalize;

    fn raw(status: u16, content_type: Option<&str>, body: &str) -> RawResponse {
        RawResponse {
            status,
            content_type: content_type.map(str::to_string),
            content_disposition: None,
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn empty_success_body_becomes_empty_object() {
        let normalized = normalize(&raw(200, None, ""));
        assert_eq!(normalized.status, 200);
        assert!(normalized.envelope.success);
        assert_eq!(normalized.envelope.data, Some(json!({})));
    }

    #[test]
    fn empty_failure_body_gets_status_message() {
        let normalized = normalize(&raw(404, None, ""));
        assert!(!normalized.envelope.success);
        assert_eq!(
            normalized.envelope.message.as_deref(),
            Some("The requested resource was not found.")
        );
    }

    #[test]
    fn backend_envelope_passes_through() {
        let normalized = normalize(&raw(
            200,
            Some("application/json"),
            r#"{"success": true, "data": {"id": "r1"}}"#,
        ));
        assert!(normalized.envelope.success);
        assert_eq!(normalized.envelope.data, Some(json!({"id": "r1"})));
    }

    #[test]
    fn bare_json_failure_is_wrapped_with_status_message() {
        let normalized = normalize(&raw(403, Some("application/json"), r#"{"detail": "nope"}"#));
        assert!(!normalized.envelope.success);
        assert_eq!(
            normalized.envelope.message.as_deref(),
            Some("You do not have permission to perform this action.")
        );
        assert_eq!(normalized.envelope.data, Some(json!({"detail": "nope"})));
    }

    #[test]
    fn deployment_error_page_is_named() {
        let body = "<!DOCTYPE html><body>DEPLOYMENT_NOT_FOUND</body>";
        let normalized = normalize(&raw(404, Some("text/html"), body));
        assert_eq!(
            normalized.envelope.message.as_deref(),
            Some("The backend deployment could not be found (status 404).")
        );
    }

    #[test]
    fn generic_html_page_is_flagged_as_html() {
        let normalized = normalize(&raw(500, Some("text/html; charset=utf-8"), "<html>boom"));
        assert_eq!(
            normalized.envelope.message.as_deref(),
            Some("The backend returned an HTML error page instead of JSON (status 500).")
        );
    }

    #[test]
    fn html_detected_from_body_without_content_type() {
        let normalized = normalize(&raw(502, None, "  <!doctype html><p>bad gateway</p>"));
        assert_eq!(
            normalized.envelope.message.as_deref(),
            Some("The backend returned an HTML error page instead of JSON (status 502).")
        );
    }

    #[test]
    fn plain_text_is_reported_as_non_json() {
        let normalized = normalize(&raw(500, Some("text/plain"), "worker crashed"));
        assert_eq!(
            normalized.envelope.message.as_deref(),
            Some("The backend returned a non-JSON response (status 500).")
        );
    }
}
