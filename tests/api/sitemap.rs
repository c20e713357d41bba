use crate::helpers::TestApp;

#[tokio::test]
async fn sitemap_lists_the_site_home_page() {
    let test_app = TestApp::spawn_app_with(|config| {
        config.application.site_url = "https://waitlist.test/".to_string();
    })
    .await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/sitemap.xml", test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/xml"));

    let body = response.text().await.unwrap();

    assert!(body.contains("<loc>https://waitlist.test/</loc>"));
    assert!(body.contains("<changefreq>weekly</changefreq>"));
}

#[tokio::test]
async fn sitemap_escapes_markup_in_the_site_url() {
    let test_app = TestApp::spawn_app_with(|config| {
        config.application.site_url = "https://waitlist.test/?a=1&b=<2>".to_string();
    })
    .await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/sitemap.xml", test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    let body = response.text().await.unwrap();

    assert!(body.contains("<loc>https://waitlist.test/?a=1&amp;b=&lt;2&gt;/</loc>"));
    assert!(!body.contains("&b=<2>"));
}
