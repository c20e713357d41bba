use std::sync::Arc;
use std::time;
use tokio::sync::OnceCell;

use crate::config::AudienceSettings;
use crate::domain::lead_email::LeadEmail;
use crate::email_client::{EmailClient, EmailClientError};

/// Adds leads as contacts of an audience on the email provider.
///
/// The audience id is resolved at most once per process and cached; the cache
/// only ever gets written by the first successful resolution.
pub struct AudienceSync {
    email_client: Option<Arc<EmailClient>>,
    enabled: bool,
    audience_id: Option<String>,
    audience_name: Option<String>,
    resolve_by_name: bool,
    throttle: time::Duration,
    retry_delay: time::Duration,
    resolved_id: OnceCell<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    AlreadyPresent,
    Skipped,
    Failed,
}

#[derive(thiserror::Error, Debug)]
pub enum AudienceError {
    #[error("No audience id is configured and lookup by name is disabled.")]
    NotConfigured,
    #[error("Failed to resolve the audience on the email provider.")]
    Provider(#[from] EmailClientError),
}

impl AudienceSync {
    pub fn new(email_client: Option<Arc<EmailClient>>, settings: &AudienceSettings) -> AudienceSync {
        AudienceSync {
            email_client,
            enabled: settings.enabled,
            audience_id: settings.get_id(),
            audience_name: settings.get_name(),
            resolve_by_name: settings.resolve_by_name,
            throttle: settings.get_throttle(),
            retry_delay: settings.get_retry_delay(),
            resolved_id: OnceCell::new(),
        }
    }

    /// Sync is switched on and there is an audience id or name to work with.
    pub fn is_enabled(&self) -> bool {
        self.enabled && (self.audience_id.is_some() || self.audience_name.is_some())
    }

    /// Creates the contact, retrying once after a rate limit. A contact that
    /// already exists counts as synced. Failures are logged, never raised.
    #[tracing::instrument(
        name = "Add a lead to the provider audience",
        skip(self, email),
        fields(lead_email = %email.as_ref())
    )]
    pub async fn add_contact(&self, email: &LeadEmail) -> SyncOutcome {
        let email_client = match &self.email_client {
            Some(email_client) => email_client,
            None => {
                tracing::debug!("Audience sync needs an API key, skipping");
                return SyncOutcome::Skipped;
            }
        };

        let audience_id = match self.resolve_audience_id(email_client).await {
            Ok(audience_id) => audience_id,
            Err(AudienceError::NotConfigured) => {
                tracing::warn!("No audience id configured, skipping audience sync");
                return SyncOutcome::Skipped;
            }
            Err(err) => {
                tracing::error!("Failed to resolve the audience: {:?}", err);
                return SyncOutcome::Failed;
            }
        };

        tokio::time::sleep(self.throttle).await;

        match email_client.create_contact(audience_id, email).await {
            Ok(()) => SyncOutcome::Synced,
            Err(EmailClientError::Conflict(_)) => SyncOutcome::AlreadyPresent,
            Err(EmailClientError::RateLimited(message)) => {
                tracing::warn!("Rate limited by the provider, retrying once: {}", message);
                tokio::time::sleep(self.retry_delay).await;
                self.retry_contact(email_client, audience_id, email).await
            }
            Err(err) => {
                tracing::error!("Failed to add contact to the audience: {:?}", err);
                SyncOutcome::Failed
            }
        }
    }

    async fn retry_contact(
        &self,
        email_client: &EmailClient,
        audience_id: &str,
        email: &LeadEmail,
    ) -> SyncOutcome {
        match email_client.create_contact(audience_id, email).await {
            Ok(()) => SyncOutcome::Synced,
            Err(EmailClientError::Conflict(_)) => SyncOutcome::AlreadyPresent,
            Err(err) => {
                tracing::error!("Retry to add contact to the audience failed: {:?}", err);
                SyncOutcome::Failed
            }
        }
    }

    async fn resolve_audience_id(&self, email_client: &EmailClient) -> Result<&str, AudienceError> {
        let configured_id = self.audience_id.as_ref();
        let name = self.audience_name.as_ref().filter(|_| self.resolve_by_name);

        let audience_id = self
            .resolved_id
            .get_or_try_init(|| async move {
                if let Some(audience_id) = configured_id {
                    return Ok::<String, AudienceError>(audience_id.clone());
                }

                let name = name.ok_or(AudienceError::NotConfigured)?;
                let audience = email_client.find_or_create_audience(name).await?;

                tracing::info!("Resolved audience {} to {}", name, audience.id);

                Ok(audience.id)
            })
            .await?;

        Ok(audience_id.as_str())
    }
}
