use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::domain::lead::Lead;
use crate::lead_store::LeadStore;

const EXPORT_TOKEN_HEADER: &str = "x-export-token";
const CSV_HEADER: [&str; 3] = ["email", "createdAt", "ua"];

/// Shared secret protecting the export. `None` leaves the export open.
pub struct ExportToken(pub Option<Secret<String>>);

#[derive(Deserialize, Debug)]
pub struct ExportParameters {
    pub token: Option<String>,
}

#[tracing::instrument(
    name = "Export leads as CSV",
    skip(request, parameters, lead_store, export_token)
)]
pub async fn handle_export_leads(
    request: HttpRequest,
    parameters: web::Query<ExportParameters>,
    lead_store: web::Data<LeadStore>,
    export_token: web::Data<ExportToken>,
) -> HttpResponse {
    if let Some(required) = &export_token.0 {
        let provided = parameters
            .token
            .as_deref()
            .filter(|token| !token.is_empty())
            .or_else(|| {
                request
                    .headers()
                    .get(EXPORT_TOKEN_HEADER)
                    .and_then(|value| value.to_str().ok())
            });

        if provided != Some(required.expose_secret().as_str()) {
            tracing::warn!("Lead export rejected: invalid or missing token");
            return HttpResponse::Unauthorized().finish();
        }
    }

    let leads = lead_store.read_all().await;
    let filename = format!("leads-{}.csv", Utc::now().format("%Y-%m-%d"));

    tracing::info!("Exporting {} leads", leads.len());

    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(leads_to_csv(&leads))
}

/// Renders leads as CSV: a header line, one line per lead, no trailing newline.
pub fn leads_to_csv(leads: &[Lead]) -> String {
    let rows = leads.iter().map(|lead| {
        [
            lead.email.as_str(),
            lead.created_at.as_deref().unwrap_or_default(),
            lead.ua.as_deref().unwrap_or_default(),
        ]
        .map(escape_field)
        .join(",")
    });

    std::iter::once(CSV_HEADER.join(","))
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, '"' | ',' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
