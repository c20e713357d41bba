use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::lead_email::LeadEmail;

/// One captured waitlist email, as persisted in the lead store.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ua: Option<String>,
}

impl Lead {
    pub fn new(email: &LeadEmail, captured_at: DateTime<Utc>, user_agent: Option<String>) -> Lead {
        Lead {
            email: email.as_ref().to_string(),
            created_at: Some(captured_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ua: user_agent,
        }
    }

    /// Reads a stored record leniently: fields that are missing or not strings
    /// come back empty instead of failing the whole list.
    pub fn from_record(record: &Value) -> Lead {
        let text = |field: &str| record.get(field).and_then(Value::as_str).map(String::from);

        Lead {
            email: text("email").unwrap_or_default(),
            created_at: text("createdAt"),
            ua: text("ua"),
        }
    }

    /// Stable key for a single capture, so the provider drops retried sends.
    pub fn idempotency_key(&self) -> String {
        let seed = format!(
            "{}|{}",
            self.email.to_lowercase(),
            self.created_at.as_deref().unwrap_or_default()
        );

        Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
    }
}
