//! The pure reconciliation pipeline: tables in, per-campaign report out.

use crate::config::EngineConfig;
use crate::domain::{
    AdRow, AffiliateRow, AnomalyTag, CampaignRecord, Decision, DerivedMetrics, MerchantId,
    MetricSnapshot, RawTable,
};
use crate::engine::{compute, decide, detect, match_records, DecisionAux, MatchDiagnostics, MatchMode};
use crate::ingest::columns::{AD_REQUIRED, AFFILIATE_REQUIRED};
use crate::ingest::{ad_rows, affiliate_rows, ColumnBinding, AD_FIELDS, AFFILIATE_FIELDS};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Previous-day figures keyed by (merchant id, campaign name).
pub type Baselines = HashMap<(MerchantId, String), MetricSnapshot>;

/// One matched campaign with everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignAnalysis {
    #[serde(flatten)]
    pub record: CampaignRecord,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    pub decision: Decision,
    pub decision_code: &'static str,
    pub anomaly: AnomalyTag,
}

/// Explanation attached when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub ad_rows_total: usize,
    pub affiliate_rows_total: usize,
    pub ad_valid_ids: usize,
    pub affiliate_valid_ids: usize,
    pub sample_ad_ids: Vec<String>,
    pub sample_affiliate_ids: Vec<String>,
    pub ad_columns: Vec<String>,
    pub affiliate_columns: Vec<String>,
    pub hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub campaigns: Vec<CampaignAnalysis>,
    pub diagnostics: MatchDiagnostics,
    pub diagnosis: Option<Diagnosis>,
}

/// What is known about the inputs beyond the typed rows.
#[derive(Debug, Clone, Default)]
struct InputShape {
    ad_columns: Vec<String>,
    affiliate_columns: Vec<String>,
    ad_missing: Vec<&'static str>,
    affiliate_missing: Vec<&'static str>,
    ad_header_fallback: bool,
    affiliate_header_fallback: bool,
}

/// Run the full pipeline on two ingested tables.
pub fn analyze(
    ad_table: &RawTable,
    affiliate_table: &RawTable,
    baselines: &Baselines,
    config: &EngineConfig,
) -> AnalysisReport {
    let shape = InputShape {
        ad_columns: ad_table.columns().to_vec(),
        affiliate_columns: affiliate_table.columns().to_vec(),
        ad_missing: ColumnBinding::bind(ad_table.columns(), AD_FIELDS).missing(AD_REQUIRED),
        affiliate_missing: ColumnBinding::bind(affiliate_table.columns(), AFFILIATE_FIELDS)
            .missing(AFFILIATE_REQUIRED),
        ad_header_fallback: ad_table.report().header_fallback,
        affiliate_header_fallback: affiliate_table.report().header_fallback,
    };
    if !shape.ad_missing.is_empty() || !shape.affiliate_missing.is_empty() {
        warn!(
            ad_missing = ?shape.ad_missing,
            affiliate_missing = ?shape.affiliate_missing,
            "required columns not found"
        );
    }
    let ads = ad_rows(ad_table, &config.exchange_rates);
    let affiliates = affiliate_rows(affiliate_table);
    run(&ads, &affiliates, baselines, config, &shape)
}

/// Run the pipeline on rows that are already typed, e.g. from a sync
/// source or the transaction ledger. Ad rows must already be in USD.
pub fn analyze_rows(
    ads: &[AdRow],
    affiliates: &[AffiliateRow],
    baselines: &Baselines,
    config: &EngineConfig,
) -> AnalysisReport {
    run(ads, affiliates, baselines, config, &InputShape::default())
}

fn run(
    ads: &[AdRow],
    affiliates: &[AffiliateRow],
    baselines: &Baselines,
    config: &EngineConfig,
    shape: &InputShape,
) -> AnalysisReport {
    let outcome = match_records(ads, affiliates, &config.matching);

    let campaigns: Vec<CampaignAnalysis> = outcome
        .records
        .into_iter()
        .map(|record| {
            let metrics = compute(&record, config.conservative_factor);
            let decision = decide(&metrics, &DecisionAux::from(&record), &config.decision);
            let today = MetricSnapshot {
                clicks: record.clicks,
                orders: record.orders,
                roi: metrics.conservative_roi,
                epc: metrics.conservative_epc,
                cpc: record.cpc,
            };
            let baseline = baselines.get(&(record.merchant_id.clone(), record.campaign_name.clone()));
            let anomaly = detect(&today, baseline, &config.anomaly);
            CampaignAnalysis {
                decision_code: decision.code(),
                record,
                metrics,
                decision,
                anomaly,
            }
        })
        .collect();

    let diagnosis = campaigns
        .is_empty()
        .then(|| diagnose(&outcome.diagnostics, shape));
    if let Some(d) = &diagnosis {
        warn!(hints = ?d.hints, "no campaigns matched");
    }

    let run_id = Uuid::new_v4();
    info!(
        %run_id,
        campaigns = campaigns.len(),
        duplicates = outcome.diagnostics.duplicate_key_campaigns,
        mode = ?outcome.diagnostics.match_mode,
        "analysis complete"
    );

    AnalysisReport {
        run_id,
        campaigns,
        diagnostics: outcome.diagnostics,
        diagnosis,
    }
}

fn diagnose(diag: &MatchDiagnostics, shape: &InputShape) -> Diagnosis {
    let mut hints = Vec::new();
    if diag.ad_rows_total == 0 {
        hints.push("ad export has no data rows".to_string());
    }
    if diag.affiliate_rows_total == 0 {
        hints.push("affiliate export has no data rows".to_string());
    }
    if !shape.ad_missing.is_empty() {
        hints.push(format!(
            "ad export is missing column(s): {}",
            shape.ad_missing.join(", ")
        ));
    }
    if !shape.affiliate_missing.is_empty() {
        hints.push(format!(
            "affiliate export is missing column(s): {}",
            shape.affiliate_missing.join(", ")
        ));
    }
    if shape.ad_header_fallback {
        hints.push("ad export header looked garbled; its first data row was used as header".to_string());
    }
    if shape.affiliate_header_fallback {
        hints.push(
            "affiliate export header looked garbled; its first data row was used as header"
                .to_string(),
        );
    }
    if diag.ad_rows_total > 0 && diag.ad_valid_ids == 0 {
        hints.push(
            "no campaign name ends in a numeric merchant id (expected e.g. 007-LB1-Acme-US-0125-240088)"
                .to_string(),
        );
    }
    if diag.affiliate_rows_total > 0 && diag.affiliate_valid_ids == 0 {
        hints.push("no affiliate row carries a usable merchant id".to_string());
    }
    if diag.ad_valid_ids > 0 && diag.affiliate_valid_ids > 0 && diag.match_mode == MatchMode::Key {
        hints.push(
            "merchant ids on the two sides do not overlap; compare the sample ids".to_string(),
        );
    }

    Diagnosis {
        ad_rows_total: diag.ad_rows_total,
        affiliate_rows_total: diag.affiliate_rows_total,
        ad_valid_ids: diag.ad_valid_ids,
        affiliate_valid_ids: diag.affiliate_valid_ids,
        sample_ad_ids: diag.sample_ad_ids.clone(),
        sample_affiliate_ids: diag.sample_affiliate_ids.clone(),
        ad_columns: shape.ad_columns.clone(),
        affiliate_columns: shape.affiliate_columns.clone(),
        hints,
    }
}
