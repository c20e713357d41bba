use std::sync::Arc;

use crate::domain::lead::Lead;
use crate::domain::lead_email::LeadEmail;
use crate::email_client::{EmailClient, SendEmail};

/// Tells the operator about every captured lead with a one-line email.
pub struct LeadNotifier {
    email_client: Option<Arc<EmailClient>>,
    sender: String,
    recipient: Option<LeadEmail>,
    subject: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Skipped,
    Failed,
}

impl LeadNotifier {
    pub fn new(
        email_client: Option<Arc<EmailClient>>,
        sender: String,
        recipient: Option<LeadEmail>,
        subject: String,
    ) -> LeadNotifier {
        LeadNotifier {
            email_client,
            sender,
            recipient,
            subject,
        }
    }

    /// Best effort: a missing API key or recipient skips the send, provider
    /// failures are logged and never raised.
    #[tracing::instrument(
        name = "Forward a new lead to the operator",
        skip(self, lead),
        fields(lead_email = %lead.email)
    )]
    pub async fn notify(&self, lead: &Lead) -> DeliveryOutcome {
        let (email_client, recipient) = match (&self.email_client, &self.recipient) {
            (Some(email_client), Some(recipient)) => (email_client, recipient),
            _ => {
                tracing::debug!("Lead notification is not configured");
                return DeliveryOutcome::Skipped;
            }
        };

        let text = format!("Email: {}", lead.email);
        let idempotency_key = lead.idempotency_key();
        let email = SendEmail {
            from: &self.sender,
            to: recipient,
            subject: &self.subject,
            text: &text,
            idempotency_key: &idempotency_key,
        };

        match email_client.send_email(&email).await {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(err) => {
                tracing::error!("Failed to forward lead notification: {:?}", err);
                DeliveryOutcome::Failed
            }
        }
    }
}
