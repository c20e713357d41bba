use serde_json::json;
use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{TestApp, EXPORT_TOKEN};

#[tokio::test]
async fn export_without_token_is_rejected_with_401() {
    let test_app = TestApp::spawn_app().await;

    let test_cases = vec![(None, "missing token"), (Some("wrong"), "wrong token")];

    for (token, description) in test_cases {
        let response = test_app.get_leads(token).await;

        assert_eq!(
            401,
            response.status().as_u16(),
            "The export did not fail with 401 when using a {}",
            description
        );
        assert!(response.text().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn export_returns_the_leads_as_a_csv_attachment() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&test_app.email_server)
        .await;

    test_app
        .post_subscription(json!({"email": "frank@test.com"}))
        .await;

    let response = test_app.get_leads(Some(EXPORT_TOKEN)).await;

    assert_eq!(200, response.status().as_u16());

    let headers = response.headers();

    assert_eq!(headers["content-type"], "text/csv; charset=utf-8");

    let disposition = headers["content-disposition"].to_str().unwrap();

    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("filename=\"leads-"));
    assert!(disposition.contains(".csv"));

    let csv = response.text().await.unwrap();
    let lines: Vec<&str> = csv.split('\n').collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "email,createdAt,ua");
    assert!(lines[1].starts_with("frank@test.com,"));
    assert!(lines[1].ends_with(",waitlist-tests/1.0"));
}

#[tokio::test]
async fn export_accepts_the_token_from_a_header() {
    let test_app = TestApp::spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/leads", test_app.address))
        .header("x-export-token", EXPORT_TOKEN)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    assert_eq!(response.text().await.unwrap(), "email,createdAt,ua");
}

#[tokio::test]
async fn export_is_open_when_no_token_is_configured() {
    let test_app = TestApp::spawn_app_with(|config| config.export.token = None).await;

    let response = test_app.get_leads(None).await;

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn export_of_a_corrupt_lead_file_is_empty() {
    let test_app = TestApp::spawn_app().await;
    let file_path = test_app.lead_store.file_path().to_path_buf();

    std::fs::create_dir_all(file_path.parent().unwrap()).unwrap();
    std::fs::write(&file_path, "not json at all").unwrap();

    let response = test_app.get_leads(Some(EXPORT_TOKEN)).await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(response.text().await.unwrap(), "email,createdAt,ua");
}
