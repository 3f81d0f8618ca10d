//! Pure computation engine(s) for reconciliation and recommendations.

pub mod anomaly;
pub mod decision;
pub mod keys;
pub mod ledger;
pub mod matcher;
pub mod metrics;

pub use anomaly::{detect, AnomalyThresholds};
pub use decision::{decide, DecisionAux, DecisionRules};
pub use keys::{ad_merchant_key, extract_country, extract_merchant_id, normalize_merchant_id};
pub use ledger::{
    aggregate_daily, dedupe, dedupe_and_aggregate, normalize_batch, normalize_status,
    summarize_by_merchant, DailyLedger, LedgerMetrics,
};
pub use matcher::{match_records, MatchDiagnostics, MatchMode, MatchOptions, MatchOutcome};
pub use metrics::{compute, DEFAULT_CONSERVATIVE_FACTOR};
