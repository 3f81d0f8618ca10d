//! Storage seams of the analysis pipeline.

use crate::domain::{DailyCampaignMetric, MetricKey, PlatformId, UserId};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to previously persisted daily rows.
#[async_trait]
pub trait BaselineStore: Send + Sync {
    async fn load_day(
        &self,
        user: &UserId,
        platform: &PlatformId,
        date: NaiveDate,
    ) -> Result<Vec<DailyCampaignMetric>, StoreError>;
}

/// Write-only destination for analysis output. Upsert on the metric key.
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn upsert(&self, rows: &[DailyCampaignMetric]) -> Result<usize, StoreError>;
}

/// Process-local store implementing both seams, for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryMetricStore {
    rows: Mutex<HashMap<MetricKey, DailyCampaignMetric>>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BaselineStore for InMemoryMetricStore {
    async fn load_day(
        &self,
        user: &UserId,
        platform: &PlatformId,
        date: NaiveDate,
    ) -> Result<Vec<DailyCampaignMetric>, StoreError> {
        let rows = self
            .rows
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut out: Vec<DailyCampaignMetric> = rows
            .values()
            .filter(|r| &r.key.user_id == user && &r.key.platform_id == platform && r.key.date == date)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }
}

#[async_trait]
impl MetricSink for InMemoryMetricStore {
    async fn upsert(&self, rows: &[DailyCampaignMetric]) -> Result<usize, StoreError> {
        let mut stored = self
            .rows
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        for row in rows {
            stored.insert(row.key.clone(), row.clone());
        }
        Ok(rows.len())
    }
}
