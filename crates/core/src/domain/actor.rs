use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Roles that may review project requests: mentors and above.
pub const REVIEWER_ROLES: [&str; 3] = ["mentor", "researcher", "admin"];

/// Platform role as reported by the backend. The set is open; the evaluator
/// only special-cases `"admin"` and the reviewer tier, compared exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role(pub String);

impl Role {
    pub fn is_admin(&self) -> bool {
        self.0 == "admin"
    }

    pub fn is_mentor_or_higher(&self) -> bool {
        REVIEWER_ROLES.contains(&self.0.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated user a capability set is evaluated for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Actor { id: id.into(), role: Role(role.into()) }
    }

    /// Builds an actor from a backend profile payload. Identifier extraction
    /// mirrors request submitters (`_id` preferred over `id`); a payload
    /// without a usable identifier or role yields `None` so callers fall
    /// back to the restrictive degenerate evaluation.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let id = non_empty_string(payload.get("_id")).or_else(|| non_empty_string(payload.get("id")))?;
        let role = non_empty_string(payload.get("role"))?;
        Some(Actor { id, role: Role(role) })
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    let raw = value?.as_str()?.trim();
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Bearer credential exactly as received in the inbound `Authorization`
/// header and forwarded verbatim to the backend. Wrapped so Debug and log
/// output can never leak it.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    pub fn new(header_value: impl Into<String>) -> Self {
        BearerToken(SecretString::from(header_value.into()))
    }

    /// The raw header value, for constructing the outbound request only.
    pub fn header_value(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(redacted)")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Actor, BearerToken, Role};

    #[test]
    fn admin_is_exact_match() {
        assert!(Role("admin".to_string()).is_admin());
        assert!(!Role("Admin".to_string()).is_admin());
        assert!(!Role("administrator".to_string()).is_admin());
    }

    #[test]
    fn reviewer_tier_covers_mentor_researcher_admin() {
        for role in ["mentor", "researcher", "admin"] {
            assert!(Role(role.to_string()).is_mentor_or_higher(), "{role}");
        }
        assert!(!Role("member".to_string()).is_mentor_or_higher());
        assert!(!Role("".to_string()).is_mentor_or_higher());
    }

    #[test]
    fn actor_from_payload_prefers_record_id() {
        let actor = Actor::from_payload(&json!({
            "_id": "u-1",
            "id": "ignored",
            "role": "mentor"
        }))
        .expect("actor");
        assert_eq!(actor.id, "u-1");
        assert_eq!(actor.role.0, "mentor");
    }

    #[test]
    fn actor_from_payload_requires_id_and_role() {
        assert_eq!(Actor::from_payload(&json!({ "role": "admin" })), None);
        assert_eq!(Actor::from_payload(&json!({ "id": "u-2" })), None);
        assert_eq!(Actor::from_payload(&json!({ "id": " ", "role": "admin" })), None);
    }

    #[test]
    fn bearer_token_debug_is_redacted() {
        let token = BearerToken::new("Bearer super-secret");
        assert_eq!(format!("{token:?}"), "BearerToken(redacted)");
        assert_eq!(token.header_value(), "Bearer super-secret");
    }
}
