//! Unauthenticated endpoints for humans and load balancers.

use actix_web::{get, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[get("/")]
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": "Welcome to the backend API!" }))
}

/// Liveness probe. Does not touch the database.
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthReport {
        status: "ok",
        timestamp: Utc::now(),
    })
}
