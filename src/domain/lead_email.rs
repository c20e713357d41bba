use regex::Regex;
use std::sync::LazyLock;

/// `something@something.something` on a single line, anywhere in the input.
static LOOSE_EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\n\r\x{2028}\x{2029}]+@[^\n\r\x{2028}\x{2029}]+\.[^\n\r\x{2028}\x{2029}]+")
        .expect("loose email regex should compile")
});

/// Email address of a lead.
///
/// Validation is deliberately loose and the original casing is kept.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LeadEmail(String);

impl LeadEmail {
    pub fn parse(email: String) -> Result<LeadEmail, String> {
        if !LOOSE_EMAIL_REGEX.is_match(&email) {
            return Err(format!("{} email is not valid", email));
        }

        Ok(Self(email))
    }
}

impl AsRef<str> for LeadEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
