//! The normalized `{success, message?, data?}` response shape every gateway
//! route returns, no matter what the backend produced.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Envelope { success: true, message: None, data: Some(data) }
    }

    pub fn success_with_message(data: Value, message: impl Into<String>) -> Self {
        Envelope { success: true, message: Some(message.into()), data: Some(data) }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Envelope { success: false, message: Some(message.into()), data: None }
    }

    /// Folds a decoded backend JSON body into the envelope shape. Bodies that
    /// already carry a boolean `success` pass through (a missing message on a
    /// failed reply gets the status-derived one); anything else is wrapped,
    /// with `success` taken from the HTTP status.
    pub fn from_json(value: Value, status: u16) -> Self {
        let ok = is_success_status(status);

        if let Some(envelope) = as_backend_envelope(&value) {
            return envelope.with_failure_message(status);
        }

        if ok {
            return Envelope::success(value);
        }

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| value.get("error").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| message_for_status(status));

        Envelope { success: false, message: Some(message), data: Some(value) }
    }

    fn with_failure_message(mut self, status: u16) -> Self {
        if !self.success && self.message.is_none() {
            self.message = Some(message_for_status(status));
        }
        self
    }
}

/// Human message for a backend status code. The four statuses the console
/// handles specially get tailored text; everything else is generic.
pub fn message_for_status(status: u16) -> String {
    match status {
        401 => "Your session has expired. Please sign in again.".to_string(),
        403 => "You do not have permission to perform this action.".to_string(),
        404 => "The requested resource was not found.".to_string(),
        500 => "The server encountered an internal error. Please try again later.".to_string(),
        other => format!("Request failed with status {other}."),
    }
}

pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

fn as_backend_envelope(value: &Value) -> Option<Envelope> {
    let object = value.as_object()?;
    let success = object.get("success")?.as_bool()?;

    Some(Envelope {
        success,
        message: object.get("message").and_then(Value::as_str).map(str::to_string),
        data: object.get("data").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{message_for_status, Envelope};

    #[test]
    fn tailored_messages_for_console_handled_statuses() {
        assert!(message_for_status(401).contains("session has expired"));
        assert!(message_for_status(403).contains("permission"));
        assert!(message_for_status(404).contains("not found"));
        assert!(message_for_status(500).contains("internal error"));
        assert_eq!(message_for_status(418), "Request failed with status 418.");
    }

    #[test]
    fn backend_envelopes_pass_through() {
        let value = json!({ "success": true, "message": "saved", "data": { "id": "u1" } });
        let envelope = Envelope::from_json(value, 200);

        assert!(envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("saved"));
        assert_eq!(envelope.data, Some(json!({ "id": "u1" })));
    }

    #[test]
    fn failed_envelope_without_message_gets_status_text() {
        let envelope = Envelope::from_json(json!({ "success": false }), 404);
        assert!(!envelope.success);
        assert_eq!(envelope.message, Some(message_for_status(404)));
    }

    #[test]
    fn bare_json_is_wrapped_by_http_status() {
        let listed = Envelope::from_json(json!([1, 2, 3]), 200);
        assert!(listed.success);
        assert_eq!(listed.data, Some(json!([1, 2, 3])));
        assert_eq!(listed.message, None);

        let failed = Envelope::from_json(json!({ "error": "no such user" }), 404);
        assert!(!failed.success);
        assert_eq!(failed.message.as_deref(), Some("no such user"));
        assert_eq!(failed.data, Some(json!({ "error": "no such user" })));
    }

    #[test]
    fn failure_helper_omits_data() {
        let envelope = Envelope::failure("nope");
        let value = serde_json::to_value(envelope).expect("serialize");
        assert_eq!(value, json!({ "success": false, "message": "nope" }));
    }
}
