pub mod analysis;
pub mod health;
pub mod ledger;
pub mod metrics;

use crate::db::Repository;
use crate::error::AppError;
use crate::orchestration::Analyzer;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, analyzer: Arc<Analyzer>) -> Self {
        Self { repo, analyzer }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/analysis", post(analysis::post_analysis))
        .route("/v1/ledger", post(ledger::post_ledger))
        .route("/v1/metrics", get(metrics::get_metrics))
        .layer(cors)
        .with_state(state)
}

/// Parse a `YYYY-MM-DD` request field.
pub(crate) fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("{} must be YYYY-MM-DD", field)))
}

pub(crate) fn require(field: &str, raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
