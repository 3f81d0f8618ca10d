//! Upstream sync abstraction: rows pulled from ad platforms and affiliate
//! networks for one (user, platform, day).

use crate::domain::{AdRow, AffiliateRow, PlatformId, UserId};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;

pub mod mock;

pub use mock::MockSyncSource;

/// Provider of already-synced upstream rows.
///
/// Implementations own transport, pagination and retry; the analysis
/// pipeline only sees the resulting rows.
#[async_trait]
pub trait SyncSource: Send + Sync + fmt::Debug {
    /// Ad-platform performance rows for the day.
    async fn fetch_ad_rows(
        &self,
        user: &UserId,
        platform: &PlatformId,
        date: NaiveDate,
    ) -> Result<Vec<AdRow>, DataSourceError>;

    /// Affiliate-network commission rows for the day.
    async fn fetch_affiliate_rows(
        &self,
        user: &UserId,
        platform: &PlatformId,
        date: NaiveDate,
    ) -> Result<Vec<AffiliateRow>, DataSourceError>;

    /// Raw transaction records in the platform's own field names.
    async fn fetch_transactions(
        &self,
        user: &UserId,
        platform: &PlatformId,
        date: NaiveDate,
    ) -> Result<Vec<Value>, DataSourceError>;
}

/// Error type for sync source operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSourceError {
    /// Upstream could not be reached or refused the request.
    Unavailable(String),
    /// Upstream answered with something that is not rows.
    ParseError(String),
    /// No credentials or account mapping for this user/platform.
    NotConfigured { user: String, platform: String },
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::Unavailable(msg) => write!(f, "Upstream unavailable: {}", msg),
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::NotConfigured { user, platform } => {
                write!(f, "No sync configured for user {} on {}", user, platform)
            }
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
