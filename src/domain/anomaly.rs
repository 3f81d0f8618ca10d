//! Day-over-day anomaly tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of comparing today's campaign figures with yesterday's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyTag {
    /// No prior-day row to compare against.
    NoBaseline,
    /// Compared, nothing unusual.
    None,
    ClicksDrop,
    OrdersDrop,
    RoiCollapse,
    EpcDrop,
    CpcSpike,
}

impl AnomalyTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyTag::NoBaseline => "no_baseline",
            AnomalyTag::None => "none",
            AnomalyTag::ClicksDrop => "clicks_drop",
            AnomalyTag::OrdersDrop => "orders_drop",
            AnomalyTag::RoiCollapse => "roi_collapse",
            AnomalyTag::EpcDrop => "epc_drop",
            AnomalyTag::CpcSpike => "cpc_spike",
        }
    }

    /// True when a comparison happened and flagged something.
    pub fn is_signal(&self) -> bool {
        !matches!(self, AnomalyTag::NoBaseline | AnomalyTag::None)
    }
}

impl fmt::Display for AnomalyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnomalyTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_baseline" => Ok(AnomalyTag::NoBaseline),
            "none" => Ok(AnomalyTag::None),
            "clicks_drop" => Ok(AnomalyTag::ClicksDrop),
            "orders_drop" => Ok(AnomalyTag::OrdersDrop),
            "roi_collapse" => Ok(AnomalyTag::RoiCollapse),
            "epc_drop" => Ok(AnomalyTag::EpcDrop),
            "cpc_spike" => Ok(AnomalyTag::CpcSpike),
            other => Err(format!("unknown anomaly tag: {}", other)),
        }
    }
}

/// The per-campaign figures the anomaly detector compares across days.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub clicks: f64,
    pub orders: f64,
    pub roi: Option<f64>,
    pub epc: f64,
    pub cpc: f64,
}
