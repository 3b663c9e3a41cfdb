use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub converter: String,
    pub version: String,
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let converter_status = if state.conversion.runner().health_check().await {
        "available"
    } else {
        "unavailable"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        converter: converter_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
