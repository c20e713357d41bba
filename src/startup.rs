use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::audience::AudienceSync;
use crate::config::Settings;
use crate::email_client::EmailClient;
use crate::lead_store::LeadStore;
use crate::notifier::LeadNotifier;
use crate::routes::{
    handle_export_leads, handle_sitemap, handle_subscribe, health_check, ExportToken, SiteUrl,
};

pub struct Application {
    pub port: u16,
    pub server: Server,
}

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("Failed to load the configuration.")]
    Config(#[from] config::ConfigError),
    #[error("Failed to bind or run the HTTP server.")]
    Io(#[from] std::io::Error),
    #[error("Failed to build the email provider client.")]
    EmailClient(#[from] reqwest::Error),
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, StartupError> {
        // Without an API key nothing is sent to the provider
        let email_client = match config.email_client.get_api_key() {
            Some(api_key) => Some(Arc::new(EmailClient::new(
                config.email_client.get_base_url(),
                api_key,
                Some(config.email_client.get_timeout()),
            )?)),
            None => {
                tracing::warn!("No email provider API key configured, leads stay local");
                None
            }
        };
        let recipient = config
            .notification
            .get_recipient()
            .map_err(StartupError::InvalidSetting)?;

        let lead_store = LeadStore::new(config.leads.data_dir.clone(), &config.leads.file_name);
        let notifier = LeadNotifier::new(
            email_client.clone(),
            config.email_client.sender.clone(),
            recipient,
            config.notification.subject.clone(),
        );
        let audience_sync = AudienceSync::new(email_client, &config.audience);
        let export_token = ExportToken(config.export.get_token());
        let site_url = SiteUrl(config.get_site_url());

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            lead_store,
            notifier,
            audience_sync,
            export_token,
            site_url,
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    lead_store: LeadStore,
    notifier: LeadNotifier,
    audience_sync: AudienceSync,
    export_token: ExportToken,
    site_url: SiteUrl,
) -> Result<Server, std::io::Error> {
    let lead_store = web::Data::new(lead_store);
    let notifier = web::Data::new(notifier);
    let audience_sync = web::Data::new(audience_sync);
    let export_token = web::Data::new(export_token);
    let site_url = web::Data::new(site_url);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/api/subscribe", web::post().to(handle_subscribe))
            .route("/api/leads", web::get().to(handle_export_leads))
            .route("/sitemap.xml", web::get().to(handle_sitemap))
            .app_data(lead_store.clone())
            .app_data(notifier.clone())
            .app_data(audience_sync.clone())
            .app_data(export_token.clone())
            .app_data(site_url.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
