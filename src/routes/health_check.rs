//! src/routes/health_check.rs
use actix_web::{HttpResponse, Responder};

#[tracing::instrument(name = "Health check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok()
}
