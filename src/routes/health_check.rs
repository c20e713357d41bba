use actix_web::HttpResponse;

/// Liveness check: answers 200 with an empty body while the server is up
#[tracing::instrument(name = "Health Check handler")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}
