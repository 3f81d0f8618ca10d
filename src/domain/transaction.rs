//! Canonical affiliate transaction.

use crate::domain::Decimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-state settlement status shared by every platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Approved,
    Pending,
    Rejected,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Approved => write!(f, "approved"),
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A platform transaction after status mapping and field normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTransaction {
    pub transaction_id: String,
    pub status: TxStatus,
    pub commission_amount: Decimal,
    pub order_amount: Decimal,
    pub merchant: Option<String>,
    pub transaction_time: Option<NaiveDateTime>,
}
