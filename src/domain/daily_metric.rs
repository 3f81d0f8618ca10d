//! Persisted per-campaign daily output row.

use crate::domain::{
    AnomalyTag, CampaignRecord, Decision, DerivedMetrics, MerchantId, MetricSnapshot, PlatformId,
    UserId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upsert key: unique per day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricKey {
    pub user_id: UserId,
    pub platform_id: PlatformId,
    pub merchant_id: MerchantId,
    pub campaign_name: String,
    pub date: NaiveDate,
}

/// One matched campaign for one day, with derived metrics and the
/// recommendation text as they were rendered when the row was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCampaignMetric {
    #[serde(flatten)]
    pub key: MetricKey,
    pub country: Option<String>,
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
    pub conservative_commission: f64,
    pub conservative_epc: f64,
    pub conservative_roi: Option<f64>,
    pub decision: String,
    pub anomaly_tag: String,
}

impl DailyCampaignMetric {
    pub fn from_parts(
        user_id: &UserId,
        platform_id: &PlatformId,
        date: NaiveDate,
        record: &CampaignRecord,
        metrics: &DerivedMetrics,
        decision: &Decision,
        anomaly: AnomalyTag,
    ) -> Self {
        Self {
            key: MetricKey {
                user_id: user_id.clone(),
                platform_id: platform_id.clone(),
                merchant_id: record.merchant_id.clone(),
                campaign_name: record.campaign_name.clone(),
                date,
            },
            country: record.country.clone(),
            clicks: record.clicks,
            cost: record.cost,
            cpc: record.cpc,
            max_cpc: record.max_cpc,
            budget: record.budget,
            budget_lost_share: record.budget_lost_share,
            rank_lost_share: record.rank_lost_share,
            orders: record.orders,
            commission: record.commission,
            order_days: record.order_days,
            conservative_commission: metrics.conservative_commission,
            conservative_epc: metrics.conservative_epc,
            conservative_roi: metrics.conservative_roi,
            decision: decision.to_string(),
            anomaly_tag: anomaly.to_string(),
        }
    }

    /// Figures used as the next day's anomaly baseline.
    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            clicks: self.clicks,
            orders: self.orders,
            roi: self.conservative_roi,
            epc: self.conservative_epc,
            cpc: self.cpc,
        }
    }
}
