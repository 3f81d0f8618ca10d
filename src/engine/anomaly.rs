//! Day-over-day anomaly classification.

use crate::domain::{AnomalyTag, MetricSnapshot};
use serde::{Deserialize, Serialize};

/// Relative drop/spike thresholds, as fractions of the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    pub clicks_drop: f64,
    pub orders_drop: f64,
    /// Baseline orders needed before an orders drop is meaningful.
    pub orders_min_baseline: f64,
    /// Absolute ROI fall required for a collapse.
    pub roi_collapse_drop: f64,
    pub epc_drop: f64,
    pub cpc_spike: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            clicks_drop: 0.5,
            orders_drop: 0.5,
            orders_min_baseline: 2.0,
            roi_collapse_drop: 0.5,
            epc_drop: 0.4,
            cpc_spike: 0.3,
        }
    }
}

/// Fractional fall from `before` to `after`; `None` when there is no
/// positive baseline to divide by.
fn relative_drop(before: f64, after: f64) -> Option<f64> {
    (before > 0.0).then(|| (before - after) / before)
}

fn relative_rise(before: f64, after: f64) -> Option<f64> {
    (before > 0.0).then(|| (after - before) / before)
}

/// Compare today against yesterday. Highest-priority signal wins:
/// roi_collapse, orders_drop, clicks_drop, epc_drop, cpc_spike.
pub fn detect(
    today: &MetricSnapshot,
    yesterday: Option<&MetricSnapshot>,
    t: &AnomalyThresholds,
) -> AnomalyTag {
    let Some(base) = yesterday else {
        return AnomalyTag::NoBaseline;
    };

    let roi_collapse = match (base.roi, today.roi) {
        (Some(before), Some(after)) => {
            before >= 0.0 && after < 0.0 && before - after >= t.roi_collapse_drop
        }
        _ => false,
    };
    if roi_collapse {
        return AnomalyTag::RoiCollapse;
    }

    if base.orders >= t.orders_min_baseline
        && relative_drop(base.orders, today.orders).is_some_and(|d| d >= t.orders_drop)
    {
        return AnomalyTag::OrdersDrop;
    }
    if relative_drop(base.clicks, today.clicks).is_some_and(|d| d >= t.clicks_drop) {
        return AnomalyTag::ClicksDrop;
    }
    if relative_drop(base.epc, today.epc).is_some_and(|d| d >= t.epc_drop) {
        return AnomalyTag::EpcDrop;
    }
    if relative_rise(base.cpc, today.cpc).is_some_and(|r| r >= t.cpc_spike) {
        return AnomalyTag::CpcSpike;
    }
    AnomalyTag::None
}
