use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::{parse_date, require, AppState};
use crate::domain::{PlatformId, UserId};
use crate::error::AppError;
use crate::orchestration::{AnalysisRequest, AnalysisRun};

/// Two exports as delimited text plus the run scope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisBody {
    pub user_id: String,
    pub platform_id: String,
    /// Defaults to today (UTC).
    pub date: Option<String>,
    #[serde(default)]
    pub persist: bool,
    pub ad_export: String,
    pub affiliate_export: String,
}

/// Run the reconciliation pipeline. A run that matches nothing is still a
/// 200 with `diagnosis` filled in.
pub async fn post_analysis(
    State(state): State<AppState>,
    Json(body): Json<AnalysisBody>,
) -> Result<Json<AnalysisRun>, AppError> {
    let user_id = UserId::new(require("userId", &body.user_id)?);
    let platform_id = PlatformId::new(require("platformId", &body.platform_id)?);
    let date = match body.date.as_deref() {
        Some(raw) => parse_date("date", raw)?,
        None => chrono::Utc::now().date_naive(),
    };

    let req = AnalysisRequest {
        user_id,
        platform_id,
        date,
        persist: body.persist,
    };
    let run = state
        .analyzer
        .run_exports(&req, body.ad_export.as_bytes(), body.affiliate_export.as_bytes())
        .await?;

    Ok(Json(run))
}
