use actix_web::http::header::USER_AGENT;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;

use crate::audience::{AudienceSync, SyncOutcome};
use crate::domain::lead::Lead;
use crate::domain::subscribe_payload::SubscribePayload;
use crate::lead_store::{LeadStore, StoreOutcome};
use crate::notifier::{DeliveryOutcome, LeadNotifier};

/// What happened to a lead after validation. None of it reaches the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionReport {
    pub stored: StoreOutcome,
    pub notified: DeliveryOutcome,
    pub synced: SyncOutcome,
}

#[tracing::instrument(
    name = "Subscribing a new lead",
    skip(request, body, lead_store, notifier, audience_sync),
    fields(lead_email = tracing::field::Empty)
)]
pub async fn handle_subscribe(
    request: HttpRequest,
    body: web::Bytes,
    lead_store: web::Data<LeadStore>,
    notifier: web::Data<LeadNotifier>,
    audience_sync: web::Data<AudienceSync>,
) -> Result<HttpResponse, SubscribeError> {
    let body: serde_json::Value =
        serde_json::from_slice(&body).map_err(SubscribeError::MalformedBody)?;
    let payload = SubscribePayload::from_json(body).ok_or(SubscribeError::NullBody)?;

    if payload.is_bot() {
        tracing::info!("Honeypot field filled, ignoring the submission");
        return Ok(confirmation());
    }

    let email = payload.lead_email().map_err(SubscribeError::InvalidEmail)?;

    tracing::Span::current().record("lead_email", tracing::field::display(email.as_ref()));

    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(String::from);
    let lead = Lead::new(&email, Utc::now(), user_agent);

    let stored = lead_store.append(lead.clone()).await;
    let notified = notifier.notify(&lead).await;
    let synced = if audience_sync.is_enabled() {
        audience_sync.add_contact(&email).await
    } else {
        SyncOutcome::Skipped
    };

    let report = SubscriptionReport {
        stored,
        notified,
        synced,
    };

    tracing::info!(?report, "Lead captured");

    Ok(confirmation())
}

fn confirmation() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Email invalide")]
    InvalidEmail(String),
    #[error("Erreur serveur")]
    MalformedBody(#[source] serde_json::Error),
    #[error("Erreur serveur")]
    NullBody,
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscribeError::InvalidEmail(reason) => write!(f, "{}\nCaused by:\n\t{}", self, reason),
            SubscribeError::MalformedBody(err) => write!(f, "{}\nCaused by:\n\t{}", self, err),
            SubscribeError::NullBody => write!(f, "{}\nCaused by:\n\tbody is null", self),
        }
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            SubscribeError::MalformedBody(_) | SubscribeError::NullBody => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}
