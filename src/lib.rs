pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use crate::config::ServerConfig;
use crate::services::conversion::ConversionService;
use crate::services::converter::{ConverterRunner, ScriptConverter};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Path the HTML form is also reachable under
pub const FORM_PATH: &str = "/webserver/index.html";

#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub conversion: Arc<ConversionService>,
}

impl AppState {
    /// State wired to the real converter described by `config`
    pub fn from_config(config: ServerConfig) -> Self {
        let runner: Arc<dyn ConverterRunner> = Arc::new(ScriptConverter::from_config(&config));
        Self::with_runner(config, runner)
    }

    /// State with a caller-supplied converter
    pub fn with_runner(config: ServerConfig, runner: Arc<dyn ConverterRunner>) -> Self {
        let conversion = Arc::new(ConversionService::new(runner, config.temp_root.clone()));
        Self { config, conversion }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::handlers::form::index))
        .route(FORM_PATH, get(api::handlers::form::index))
        .route("/convert", post(api::handlers::convert::convert_export))
        .route("/health", get(api::handlers::health::health_check))
        .fallback(api::handlers::form::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(api::middleware::request_id::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .with_state(state)
}
