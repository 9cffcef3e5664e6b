use actix_web::HttpResponse;

/// Liveness probe. No authentication, no storage access.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}
