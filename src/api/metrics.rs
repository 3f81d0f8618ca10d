use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_date, require, AppState};
use crate::domain::{DailyCampaignMetric, PlatformId, UserId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    pub user_id: String,
    pub platform_id: Option<String>,
    /// Single day; overrides `fromDate`/`toDate`.
    pub date: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub count: usize,
    pub metrics: Vec<DailyCampaignMetric>,
}

pub async fn get_metrics(
    Query(params): Query<MetricsQuery>,
    State(state): State<AppState>,
) -> Result<Json<MetricsResponse>, AppError> {
    let user = UserId::new(require("userId", &params.user_id)?);
    let platform = params
        .platform_id
        .as_deref()
        .map(|p| require("platformId", p).map(PlatformId::new))
        .transpose()?;

    let (from, to) = match params.date.as_deref() {
        Some(day) => {
            let d = parse_date("date", day)?;
            (Some(d), Some(d))
        }
        None => (
            params
                .from_date
                .as_deref()
                .map(|d| parse_date("fromDate", d))
                .transpose()?,
            params
                .to_date
                .as_deref()
                .map(|d| parse_date("toDate", d))
                .transpose()?,
        ),
    };
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(AppError::BadRequest("fromDate must be <= toDate".into()));
        }
    }

    let metrics = state
        .repo
        .query_daily_metrics(&user, platform.as_ref(), from, to)
        .await?;

    Ok(Json(MetricsResponse {
        count: metrics.len(),
        metrics,
    }))
}
