//! Threshold cascade from derived metrics to a single next action.

use crate::domain::{CampaignRecord, Decision, DerivedMetrics};
use serde::{Deserialize, Serialize};

/// Thresholds and step sizes for [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionRules {
    /// ROI below this pauses the campaign.
    pub pause_roi: f64,
    pub cpc_down_step: f64,
    pub cpc_up_step: f64,
    pub cpc_floor: f64,
    pub budget_multiplier: f64,
    pub raise_budget_roi: f64,
    /// Fraction, 0–1.
    pub raise_budget_lost_share: f64,
    pub raise_budget_min_order_days: u32,
    pub raise_cpc_roi: f64,
    /// Fraction, 0–1.
    pub raise_cpc_rank_lost_share: f64,
    /// Bid must sit below this fraction of the actual CPC to be raised.
    pub raise_cpc_bid_ratio: f64,
    pub hold_roi: f64,
}

impl Default for DecisionRules {
    fn default() -> Self {
        Self {
            pause_roi: -0.4,
            cpc_down_step: 0.05,
            cpc_up_step: 0.02,
            cpc_floor: 0.01,
            budget_multiplier: 1.3,
            raise_budget_roi: 3.0,
            raise_budget_lost_share: 0.2,
            raise_budget_min_order_days: 4,
            raise_cpc_roi: 2.0,
            raise_cpc_rank_lost_share: 0.15,
            raise_cpc_bid_ratio: 0.8,
            hold_roi: 1.0,
        }
    }
}

/// Record fields the cascade reads besides ROI.
///
/// Shares may be fractions (0–1) or percentages; values above 1 are read as
/// percentages. Prefer the `From<&CampaignRecord>` conversion, which knows
/// the record holds percentages.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecisionAux {
    pub budget_lost_share: Option<f64>,
    pub rank_lost_share: Option<f64>,
    pub order_days: u32,
    pub max_cpc: f64,
    pub cpc: f64,
    pub budget: f64,
}

impl From<&CampaignRecord> for DecisionAux {
    fn from(r: &CampaignRecord) -> Self {
        Self {
            budget_lost_share: r.budget_lost_share.map(|v| v / 100.0),
            rank_lost_share: r.rank_lost_share.map(|v| v / 100.0),
            order_days: r.order_days,
            max_cpc: r.max_cpc,
            cpc: r.cpc,
            budget: r.budget,
        }
    }
}

/// Shares above 1 are percentages; missing counts as zero.
fn as_fraction(share: Option<f64>) -> f64 {
    match share {
        Some(v) if v > 1.0 => v / 100.0,
        Some(v) => v,
        None => 0.0,
    }
}

fn cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// First matching rule wins. A missing ROI always lands on
/// [`Decision::InsufficientData`].
pub fn decide(metrics: &DerivedMetrics, aux: &DecisionAux, rules: &DecisionRules) -> Decision {
    let Some(roi) = metrics.conservative_roi else {
        return Decision::InsufficientData;
    };
    let budget_lost = as_fraction(aux.budget_lost_share);
    let rank_lost = as_fraction(aux.rank_lost_share);
    let bid = if aux.max_cpc > 0.0 { aux.max_cpc } else { aux.cpc };

    if roi < rules.pause_roi {
        Decision::Pause
    } else if roi < 0.0 {
        if bid > 0.0 {
            Decision::LowerCpc {
                from: bid,
                to: cents((bid - rules.cpc_down_step).max(rules.cpc_floor)).min(bid),
            }
        } else {
            Decision::LowerCpcBy {
                step: rules.cpc_down_step,
            }
        }
    } else if roi > rules.raise_budget_roi
        && budget_lost > rules.raise_budget_lost_share
        && aux.order_days >= rules.raise_budget_min_order_days
    {
        if aux.budget > 0.0 {
            Decision::RaiseBudget {
                from: aux.budget,
                to: cents(aux.budget * rules.budget_multiplier),
            }
        } else {
            Decision::RaiseBudgetBy {
                factor: rules.budget_multiplier,
            }
        }
    } else if roi > rules.raise_cpc_roi
        && rank_lost > rules.raise_cpc_rank_lost_share
        && aux.max_cpc < aux.cpc * rules.raise_cpc_bid_ratio
    {
        // Reachable only with cpc > 0, so the bid is known.
        Decision::RaiseCpc {
            from: bid,
            to: cents(bid + rules.cpc_up_step),
        }
    } else if roi >= rules.hold_roi {
        Decision::Hold
    } else {
        Decision::InsufficientData
    }
}
