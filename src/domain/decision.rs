//! Next-action recommendation for a campaign.

use serde::{Serialize, Serializer};
use std::fmt;

/// One recommendation drawn from a closed set of actions.
///
/// Amount-carrying variants keep the before/after values so the rendered
/// text can show the concrete change, e.g. `CPC $0.30→$0.25`. The `*By`
/// variants are used when the current amount is unknown and only the step
/// can be stated, e.g. `BUDGET ×1.3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Pause,
    LowerCpc { from: f64, to: f64 },
    LowerCpcBy { step: f64 },
    RaiseBudget { from: f64, to: f64 },
    RaiseBudgetBy { factor: f64 },
    RaiseCpc { from: f64, to: f64 },
    Hold,
    InsufficientData,
}

impl Decision {
    /// Stable machine code for the action.
    pub fn code(&self) -> &'static str {
        match self {
            Decision::Pause => "pause",
            Decision::LowerCpc { .. } | Decision::LowerCpcBy { .. } => "lower_cpc",
            Decision::RaiseBudget { .. } | Decision::RaiseBudgetBy { .. } => "raise_budget",
            Decision::RaiseCpc { .. } => "raise_cpc",
            Decision::Hold => "hold",
            Decision::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Pause => write!(f, "PAUSE"),
            Decision::LowerCpc { from, to } | Decision::RaiseCpc { from, to } => {
                write!(f, "CPC ${:.2}→${:.2}", from, to)
            }
            Decision::LowerCpcBy { step } => write!(f, "CPC -${:.2}", step),
            Decision::RaiseBudget { from, to } => write!(f, "BUDGET ${:.2}→${:.2}", from, to),
            Decision::RaiseBudgetBy { factor } => write!(f, "BUDGET ×{}", factor),
            Decision::Hold => write!(f, "STABLE — hold"),
            Decision::InsufficientData => write!(f, "INSUFFICIENT DATA — observe"),
        }
    }
}

impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_amount_substitution() {
        let d = Decision::LowerCpc { from: 0.3, to: 0.25 };
        assert_eq!(d.to_string(), "CPC $0.30→$0.25");
        assert_eq!(d.code(), "lower_cpc");
    }

    #[test]
    fn renders_fixed_labels() {
        assert_eq!(Decision::Pause.to_string(), "PAUSE");
        assert_eq!(Decision::Hold.to_string(), "STABLE — hold");
        assert_eq!(
            Decision::InsufficientData.to_string(),
            "INSUFFICIENT DATA — observe"
        );
    }

    #[test]
    fn serializes_as_rendered_text() {
        let json = serde_json::to_string(&Decision::RaiseBudget {
            from: 100.0,
            to: 130.0,
        })
        .unwrap();
        assert_eq!(json, "\"BUDGET $100.00→$130.00\"");
    }

    #[test]
    fn renders_step_labels() {
        assert_eq!(Decision::LowerCpcBy { step: 0.05 }.to_string(), "CPC -$0.05");
        assert_eq!(Decision::RaiseBudgetBy { factor: 1.3 }.to_string(), "BUDGET ×1.3");
        assert_eq!(Decision::RaiseBudgetBy { factor: 1.3 }.code(), "raise_budget");
        assert_eq!(Decision::LowerCpcBy { step: 0.05 }.code(), "lower_cpc");
    }
}
