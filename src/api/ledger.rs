use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::require;
use crate::domain::{AffiliateRow, PlatformId};
use crate::engine::{
    aggregate_daily, dedupe, dedupe_and_aggregate, normalize_batch, summarize_by_merchant,
    LedgerMetrics,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerBody {
    pub platform_id: String,
    /// Raw platform records, in the platform's own field names.
    pub transactions: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    pub platform_id: String,
    pub received: usize,
    pub unique_transactions: usize,
    pub overall: LedgerMetrics,
    pub daily: Vec<DailyLedgerDto>,
    pub undated: LedgerMetrics,
    pub merchants: Vec<AffiliateRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLedgerDto {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub metrics: LedgerMetrics,
}

pub async fn post_ledger(Json(body): Json<LedgerBody>) -> Result<Json<LedgerResponse>, AppError> {
    let platform = PlatformId::new(require("platformId", &body.platform_id)?);

    let transactions = normalize_batch(&platform, &body.transactions);
    let unique = dedupe(&transactions);
    let daily = aggregate_daily(&unique);

    let overall = dedupe_and_aggregate(&unique);

    Ok(Json(LedgerResponse {
        platform_id: platform.to_string(),
        received: body.transactions.len(),
        unique_transactions: unique.len(),
        overall,
        daily: daily
            .days
            .into_iter()
            .map(|(date, metrics)| DailyLedgerDto { date, metrics })
            .collect(),
        undated: daily.undated,
        merchants: summarize_by_merchant(&unique),
    }))
}
