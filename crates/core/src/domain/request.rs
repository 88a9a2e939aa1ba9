use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Review lifecycle of a project request. The backend owns transitions; this
/// layer only reads the value and asks for changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    OnHold,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::UnderReview,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::OnHold,
    ];

    /// Parses a backend status string. Tolerates surrounding whitespace and
    /// case; anything outside the five known values is `None`, which callers
    /// surface as the "Unknown" fallback rather than guessing.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "under_review" => Some(RequestStatus::UnderReview),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            "on_hold" => Some(RequestStatus::OnHold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::UnderReview => "under_review",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::OnHold => "on_hold",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submitter reference exactly as the backend sends it: either a bare
/// identifier string or an embedded profile object carrying one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedBy {
    Id(String),
    Profile {
        #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
        record_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl SubmittedBy {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Resolves the reference to a plain identifier: bare string first, then
    /// the embedded `_id`, then the embedded `id`. Empty strings count as
    /// absent so they can never satisfy an ownership check.
    pub fn resolve_id(&self) -> Option<&str> {
        match self {
            SubmittedBy::Id(id) => non_empty(id),
            SubmittedBy::Profile { record_id, id } => record_id
                .as_deref()
                .and_then(non_empty)
                .or_else(|| id.as_deref().and_then(non_empty)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl DocumentRef {
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;
        serde_json::from_value(value.clone()).ok()
    }
}

/// Read-only snapshot of a project request as served by the backend. Field
/// normalization happens exactly once, here, so the evaluator and badge
/// mapper never touch raw payload shapes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectRequest {
    pub id: RequestId,
    pub status: Option<RequestStatus>,
    /// Resolved submitter identifier; empty when the payload carried none.
    pub submitter_id: String,
    pub document: Option<DocumentRef>,
    pub is_deleted: bool,
}

impl ProjectRequest {
    /// Builds a typed snapshot from a backend payload. Malformed or missing
    /// fields degrade to their most restrictive value instead of failing:
    /// unknown statuses become `None`, unreadable submitters become the
    /// empty identifier.
    pub fn from_payload(payload: &Value) -> Self {
        let submitter_id = payload
            .get("submittedBy")
            .and_then(SubmittedBy::from_value)
            .as_ref()
            .and_then(SubmittedBy::resolve_id)
            .map(str::to_string)
            .or_else(|| string_field(payload, "submittedById"))
            .unwrap_or_default();

        ProjectRequest {
            id: RequestId(
                string_field(payload, "id")
                    .or_else(|| string_field(payload, "_id"))
                    .unwrap_or_default(),
            ),
            status: payload
                .get("status")
                .and_then(Value::as_str)
                .and_then(RequestStatus::parse),
            submitter_id,
            document: payload.get("document").and_then(DocumentRef::from_value),
            is_deleted: payload
                .get("isDeleted")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == Some(RequestStatus::Approved)
    }
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .and_then(non_empty)
        .map(str::to_string)
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
