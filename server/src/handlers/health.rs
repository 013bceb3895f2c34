use actix_web::{get, HttpResponse};
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
}

#[get("/health")]
pub async fn health_check() -> Result<HttpResponse> {
    let response = HealthCheckResponse {
        status: "healthy".to_string(),
    };

    Ok(HttpResponse::Ok().json(response))
}
