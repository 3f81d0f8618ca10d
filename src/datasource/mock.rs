//! Mock sync source for testing without upstream calls.

use super::{DataSourceError, SyncSource};
use crate::domain::{AdRow, AffiliateRow, PlatformId, UserId};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

/// Mock sync source that returns predefined rows.
///
/// Dated rows are only returned for their own day; undated rows are
/// returned for every day.
#[derive(Debug, Clone, Default)]
pub struct MockSyncSource {
    ad_rows: Vec<AdRow>,
    affiliate_rows: Vec<AffiliateRow>,
    transactions: Vec<Value>,
    failure: Option<DataSourceError>,
}

impl MockSyncSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ad_row(mut self, row: AdRow) -> Self {
        self.ad_rows.push(row);
        self
    }

    pub fn with_ad_rows(mut self, rows: Vec<AdRow>) -> Self {
        self.ad_rows.extend(rows);
        self
    }

    pub fn with_affiliate_rows(mut self, rows: Vec<AffiliateRow>) -> Self {
        self.affiliate_rows.extend(rows);
        self
    }

    pub fn with_transactions(mut self, records: Vec<Value>) -> Self {
        self.transactions.extend(records);
        self
    }

    /// Make every fetch fail with `err`.
    pub fn with_failure(mut self, err: DataSourceError) -> Self {
        self.failure = Some(err);
        self
    }

    fn check(&self) -> Result<(), DataSourceError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn on_day(row_date: Option<NaiveDate>, date: NaiveDate) -> bool {
    row_date.map_or(true, |d| d == date)
}

#[async_trait]
impl SyncSource for MockSyncSource {
    async fn fetch_ad_rows(
        &self,
        _user: &UserId,
        _platform: &PlatformId,
        date: NaiveDate,
    ) -> Result<Vec<AdRow>, DataSourceError> {
        self.check()?;
        Ok(self
            .ad_rows
            .iter()
            .filter(|r| on_day(r.date, date))
            .cloned()
            .collect())
    }

    async fn fetch_affiliate_rows(
        &self,
        _user: &UserId,
        _platform: &PlatformId,
        date: NaiveDate,
    ) -> Result<Vec<AffiliateRow>, DataSourceError> {
        self.check()?;
        Ok(self
            .affiliate_rows
            .iter()
            .filter(|r| on_day(r.date, date))
            .cloned()
            .collect())
    }

    async fn fetch_transactions(
        &self,
        _user: &UserId,
        _platform: &PlatformId,
        _date: NaiveDate,
    ) -> Result<Vec<Value>, DataSourceError> {
        self.check()?;
        Ok(self.transactions.clone())
    }
}
