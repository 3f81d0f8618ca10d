use super::analysis::{analyze, analyze_rows, AnalysisReport, Baselines};
use super::store::{BaselineStore, MetricSink, StoreError};
use crate::config::EngineConfig;
use crate::datasource::{DataSourceError, SyncSource};
use crate::domain::{AdRow, DailyCampaignMetric, PlatformId, UserId};
use crate::engine::{normalize_batch, summarize_by_merchant};
use crate::ingest::{ingest_cached, IngestError, TableCache};
use crate::normalize::apply_exchange_rate;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Whose data an analysis run covers.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub user_id: UserId,
    pub platform_id: PlatformId,
    pub date: NaiveDate,
    /// Upsert the per-campaign rows into the sink.
    pub persist: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRun {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub baseline_rows: usize,
    pub persisted_rows: usize,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("ad export: {0}")]
    AdInput(IngestError),
    #[error("affiliate export: {0}")]
    AffiliateInput(IngestError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

/// Async shell around the pure pipeline: loads yesterday's rows as the
/// anomaly baseline and optionally persists today's.
#[derive(Clone)]
pub struct Analyzer {
    baselines: Arc<dyn BaselineStore>,
    sink: Arc<dyn MetricSink>,
    cache: Arc<dyn TableCache>,
    config: EngineConfig,
}

impl Analyzer {
    pub fn new(
        baselines: Arc<dyn BaselineStore>,
        sink: Arc<dyn MetricSink>,
        cache: Arc<dyn TableCache>,
        config: EngineConfig,
    ) -> Self {
        Self {
            baselines,
            sink,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze two uploaded exports.
    pub async fn run_exports(
        &self,
        req: &AnalysisRequest,
        ad_bytes: &[u8],
        affiliate_bytes: &[u8],
    ) -> Result<AnalysisRun, AnalysisError> {
        let ad_table =
            ingest_cached(ad_bytes, self.cache.as_ref()).map_err(AnalysisError::AdInput)?;
        let affiliate_table = ingest_cached(affiliate_bytes, self.cache.as_ref())
            .map_err(AnalysisError::AffiliateInput)?;

        let (baselines, baseline_rows) = self.load_baselines(req).await?;
        let report = analyze(&ad_table, &affiliate_table, &baselines, &self.config);
        self.finish(req, report, baseline_rows).await
    }

    /// Analyze rows pulled from a sync source. When the source has no
    /// affiliate rows, they are derived from its raw transactions; dated
    /// transactions outside `req.date` are left out.
    pub async fn run_sync(
        &self,
        req: &AnalysisRequest,
        source: &dyn SyncSource,
    ) -> Result<AnalysisRun, AnalysisError> {
        let mut ads: Vec<AdRow> = source
            .fetch_ad_rows(&req.user_id, &req.platform_id, req.date)
            .await?;
        for row in &mut ads {
            apply_exchange_rate(row, &self.config.exchange_rates);
        }

        let mut affiliates = source
            .fetch_affiliate_rows(&req.user_id, &req.platform_id, req.date)
            .await?;
        if affiliates.is_empty() {
            let raw = source
                .fetch_transactions(&req.user_id, &req.platform_id, req.date)
                .await?;
            let txs = normalize_batch(&req.platform_id, &raw);
            affiliates = summarize_by_merchant(&txs);
            affiliates.retain(|r| r.date.map_or(true, |d| d == req.date));
            tracing::debug!(
                transactions = txs.len(),
                merchants = affiliates.len(),
                "affiliate rows derived from transactions"
            );
        }

        let (baselines, baseline_rows) = self.load_baselines(req).await?;
        let report = analyze_rows(&ads, &affiliates, &baselines, &self.config);
        self.finish(req, report, baseline_rows).await
    }

    async fn load_baselines(&self, req: &AnalysisRequest) -> Result<(Baselines, usize), StoreError> {
        let Some(yesterday) = req.date.pred_opt() else {
            return Ok((Baselines::new(), 0));
        };
        let rows = self
            .baselines
            .load_day(&req.user_id, &req.platform_id, yesterday)
            .await?;
        let count = rows.len();
        let baselines = rows
            .into_iter()
            .map(|r| {
                let snapshot = r.snapshot();
                ((r.key.merchant_id, r.key.campaign_name), snapshot)
            })
            .collect();
        Ok((baselines, count))
    }

    async fn finish(
        &self,
        req: &AnalysisRequest,
        report: AnalysisReport,
        baseline_rows: usize,
    ) -> Result<AnalysisRun, AnalysisError> {
        let persisted_rows = if req.persist && !report.campaigns.is_empty() {
            let rows: Vec<DailyCampaignMetric> = report
                .campaigns
                .iter()
                .map(|c| {
                    DailyCampaignMetric::from_parts(
                        &req.user_id,
                        &req.platform_id,
                        req.date,
                        &c.record,
                        &c.metrics,
                        &c.decision,
                        c.anomaly,
                    )
                })
                .collect();
            self.sink.upsert(&rows).await?
        } else {
            0
        };

        tracing::info!(
            run_id = %report.run_id,
            user = %req.user_id,
            platform = %req.platform_id,
            date = %req.date,
            baseline_rows,
            persisted_rows,
            "analysis run finished"
        );

        Ok(AnalysisRun {
            report,
            baseline_rows,
            persisted_rows,
        })
    }
}
