use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::lead_email::LeadEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);
const RATE_LIMIT_PATTERNS: [&str; 3] = ["rate limit", "rate_limit", "too many requests"];
const CONFLICT_PATTERNS: [&str; 3] = ["already exist", "already_exist", "duplicate"];

/// Client for the transactional email provider (Resend-compatible REST API).
///
/// Only the calls the waitlist needs are exposed: sending an email, adding a
/// contact to an audience and finding or creating an audience.
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum EmailClientError {
    #[error("The email provider rate limited the request: {0}")]
    RateLimited(String),
    #[error("The resource already exists on the email provider: {0}")]
    Conflict(String),
    #[error("The email provider rejected the request with {status}: {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("Failed to reach the email provider.")]
    Transport(#[from] reqwest::Error),
}

impl EmailClientError {
    /// Sorts a failed provider response by status code, falling back to the
    /// wording of the message.
    pub fn classify(status: StatusCode, message: String) -> EmailClientError {
        let lowercase = message.to_lowercase();
        let mentions = |patterns: &[&str]| patterns.iter().any(|p| lowercase.contains(p));

        if status == StatusCode::TOO_MANY_REQUESTS || mentions(&RATE_LIMIT_PATTERNS) {
            return EmailClientError::RateLimited(message);
        }

        if status == StatusCode::CONFLICT || mentions(&CONFLICT_PATTERNS) {
            return EmailClientError::Conflict(message);
        }

        EmailClientError::Rejected { status, message }
    }
}

pub struct SendEmail<'a> {
    pub from: &'a str,
    pub to: &'a LeadEmail,
    pub subject: &'a str,
    pub text: &'a str,
    pub idempotency_key: &'a str,
}

#[derive(serde::Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    text: &'a str,
}

#[derive(serde::Serialize)]
struct CreateContactBody<'a> {
    email: &'a str,
    unsubscribed: bool,
}

#[derive(serde::Serialize)]
struct CreateAudienceBody<'a> {
    name: &'a str,
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Audience {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(serde::Deserialize)]
struct AudienceList {
    #[serde(default)]
    data: Vec<Audience>,
}

#[derive(serde::Deserialize)]
struct ProviderErrorBody {
    message: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> Result<EmailClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(EmailClient {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    #[tracing::instrument(
        name = "Send an email through the provider",
        skip(self, email),
        fields(idempotency_key = %email.idempotency_key)
    )]
    pub async fn send_email(&self, email: &SendEmail<'_>) -> Result<(), EmailClientError> {
        let url = format!("{}/emails", self.base_url);
        let body = SendEmailBody {
            from: email.from,
            to: vec![email.to.as_ref()],
            subject: email.subject,
            text: email.text,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header("Idempotency-Key", email.idempotency_key)
            .json(&body)
            .send()
            .await?;

        check_status(response).await?;

        Ok(())
    }

    #[tracing::instrument(name = "Create a contact in an audience", skip(self, email))]
    pub async fn create_contact(
        &self,
        audience_id: &str,
        email: &LeadEmail,
    ) -> Result<(), EmailClientError> {
        let url = format!("{}/audiences/{}/contacts", self.base_url, audience_id);
        let body = CreateContactBody {
            email: email.as_ref(),
            unsubscribed: false,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        check_status(response).await?;

        Ok(())
    }

    pub async fn list_audiences(&self) -> Result<Vec<Audience>, EmailClientError> {
        let url = format!("{}/audiences", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;
        let list: AudienceList = check_status(response).await?.json().await?;

        Ok(list.data)
    }

    pub async fn create_audience(&self, name: &str) -> Result<Audience, EmailClientError> {
        let url = format!("{}/audiences", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&CreateAudienceBody { name })
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    #[tracing::instrument(name = "Find or create an audience by name", skip(self))]
    pub async fn find_or_create_audience(&self, name: &str) -> Result<Audience, EmailClientError> {
        let existing = self
            .list_audiences()
            .await?
            .into_iter()
            .find(|audience| audience.name == name);

        match existing {
            Some(audience) => Ok(audience),
            None => {
                tracing::info!("Audience not found, creating it");
                self.create_audience(name).await
            }
        }
    }
}

// Turns 4xx and 5xx responses into a classified error, keeping the provider message
async fn check_status(response: Response) -> Result<Response, EmailClientError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ProviderErrorBody>(&raw)
        .map(|body| body.message)
        .unwrap_or(raw);

    Err(EmailClientError::classify(status, message))
}
