//! Typed ad-side and affiliate-side rows and the merged campaign record.

use crate::domain::MerchantId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the ad-platform performance export.
///
/// Money fields are in USD once the row has passed ingestion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRow {
    pub campaign_name: String,
    /// Explicit merchant id column, if the export carried one.
    pub merchant_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub impressions: f64,
    pub clicks: f64,
    pub cost: f64,
    pub cpc: f64,
    pub max_cpc: Option<f64>,
    pub budget: f64,
    /// Percentage, 0–100.
    pub budget_lost_share: Option<f64>,
    /// Percentage, 0–100.
    pub rank_lost_share: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<String>,
}

/// One row of the affiliate-network commission export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateRow {
    pub merchant_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub orders: f64,
    pub commission: f64,
}

/// Merged per-(merchant, campaign) financial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub campaign_name: String,
    pub merchant_id: MerchantId,
    pub country: Option<String>,
    pub impressions: f64,
    pub clicks: f64,
    pub cost: f64,
    pub cpc: f64,
    pub max_cpc: f64,
    pub budget: f64,
    pub budget_lost_share: Option<f64>,
    pub rank_lost_share: Option<f64>,
    pub orders: f64,
    pub commission: f64,
    pub order_days: u32,
}

/// Profitability figures derived from a [`CampaignRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub conservative_commission: f64,
    pub conservative_epc: f64,
    /// `None` when the campaign had no spend; distinct from a computed zero.
    pub conservative_roi: Option<f64>,
}
