use actix_web::{web, HttpResponse};
use chrono::{SecondsFormat, Utc};

/// Public URL of the marketing site, without trailing slash.
pub struct SiteUrl(pub String);

#[tracing::instrument(name = "Sitemap handler", skip(site_url))]
pub async fn handle_sitemap(site_url: web::Data<SiteUrl>) -> HttpResponse {
    let last_modified = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
<url>
<loc>{}/</loc>
<lastmod>{}</lastmod>
<changefreq>weekly</changefreq>
<priority>1</priority>
</url>
</urlset>
"#,
        escape_xml(&site_url.0),
        last_modified
    );

    HttpResponse::Ok()
        .content_type("application/xml")
        .body(sitemap)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
