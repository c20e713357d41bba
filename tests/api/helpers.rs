use reqwest::Response;
use secrecy::Secret;
use tempfile::TempDir;
use wiremock::MockServer;

use waitlist::{
    config::{get_configuration, Settings},
    domain::lead::Lead,
    lead_store::LeadStore,
    startup::Application,
};

pub const EXPORT_TOKEN: &str = "export-secret";
pub const AUDIENCE_ID: &str = "aud_test";
pub const USER_AGENT: &str = "waitlist-tests/1.0";

pub struct TestApp {
    pub address: String,
    pub email_server: MockServer,
    pub lead_store: LeadStore,
    // Removed from disk when the test app is dropped
    _data_dir: TempDir,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        Self::spawn_app_with(|_| {}).await
    }

    /// Spawns the app on a random port with a mocked email provider and a
    /// temporary data directory; `customize` runs last on the settings.
    pub async fn spawn_app_with(customize: impl FnOnce(&mut Settings)) -> TestApp {
        let mut config = get_configuration().expect("Missing configuration file.");
        let email_server = MockServer::start().await;
        let data_dir = TempDir::new().expect("Failed to create a temporary data directory.");

        // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
        // take into account: when port is 0, the OS will search for the first available port
        config.set_app_port(0);
        config.set_email_client_base_url(email_server.uri());
        config.set_leads_data_dir(data_dir.path().join("data"));
        config.email_client.api_key = Some(Secret::new("test-api-key".to_string()));
        config.notification.recipient = Some("owner@test.com".to_string());
        config.audience.enabled = true;
        config.audience.id = Some(AUDIENCE_ID.to_string());
        config.audience.throttle_milliseconds = 1;
        config.audience.retry_delay_milliseconds = 5;
        config.export.token = Some(Secret::new(EXPORT_TOKEN.to_string()));

        customize(&mut config);

        let lead_store = LeadStore::new(config.leads.data_dir.clone(), &config.leads.file_name);
        let application = Application::build(config)
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            email_server,
            lead_store,
            _data_dir: data_dir,
        }
    }

    pub async fn post_subscription(&self, body: serde_json::Value) -> Response {
        self.post_raw_subscription(body.to_string()).await
    }

    pub async fn post_raw_subscription(&self, body: String) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/api/subscribe", self.address);

        client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_leads(&self, token: Option<&str>) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/api/leads", self.address);
        let mut request = client.get(&url);

        if let Some(token) = token {
            request = request.query(&[("token", token)]);
        }

        request.send().await.expect("Failed to execute request.")
    }

    pub async fn stored_leads(&self) -> Vec<Lead> {
        self.lead_store.read_all().await
    }
}
