use serde_json::Value;

use crate::domain::lead_email::LeadEmail;

/// Body of `POST /api/subscribe`.
///
/// Fields are kept as raw JSON values: a wrong type on `email` is a validation
/// failure, not a malformed body.
#[derive(Debug, Default)]
pub struct SubscribePayload {
    pub email: Value,
    // Honeypot: hidden in the form, only bots fill it
    pub hp: Value,
}

impl SubscribePayload {
    /// Reads `email` and `hp` from a JSON object. Any other non-null body has
    /// no fields at all; `null` has no payload.
    pub fn from_json(body: Value) -> Option<SubscribePayload> {
        match body {
            Value::Null => None,
            Value::Object(mut fields) => Some(SubscribePayload {
                email: fields.remove("email").unwrap_or_default(),
                hp: fields.remove("hp").unwrap_or_default(),
            }),
            _ => Some(SubscribePayload::default()),
        }
    }

    pub fn is_bot(&self) -> bool {
        match &self.hp {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => number.as_f64() != Some(0.0),
            Value::String(text) => !text.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub fn lead_email(&self) -> Result<LeadEmail, String> {
        match &self.email {
            Value::String(email) => LeadEmail::parse(email.clone()),
            other => Err(format!("{} is not a string email", other)),
        }
    }
}
