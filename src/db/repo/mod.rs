//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `daily_metrics.rs` - Daily campaign metric upserts and queries
//!
//! `Repository` also implements the pipeline's `BaselineStore` and
//! `MetricSink` seams.

mod daily_metrics;

use crate::domain::{DailyCampaignMetric, PlatformId, UserId};
use crate::orchestration::{BaselineStore, MetricSink, StoreError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePool;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Round-trip a trivial query; used by readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BaselineStore for Repository {
    async fn load_day(
        &self,
        user: &UserId,
        platform: &PlatformId,
        date: NaiveDate,
    ) -> Result<Vec<DailyCampaignMetric>, StoreError> {
        Ok(self.get_daily_metrics(user, platform, date).await?)
    }
}

#[async_trait]
impl MetricSink for Repository {
    async fn upsert(&self, rows: &[DailyCampaignMetric]) -> Result<usize, StoreError> {
        Ok(self.upsert_daily_metrics(rows).await?)
    }
}
