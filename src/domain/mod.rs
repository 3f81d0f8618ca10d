//! Domain types for the reconciliation engine.
//!
//! This module provides:
//! - Identifier primitives: UserId, PlatformId, MerchantId
//! - The ingested RawTable and typed ad/affiliate rows
//! - CampaignRecord and DerivedMetrics, Decision and AnomalyTag
//! - Canonical ledger transactions backed by exact decimals

pub mod anomaly;
pub mod campaign;
pub mod daily_metric;
pub mod decimal;
pub mod decision;
pub mod primitives;
pub mod table;
pub mod transaction;

pub use anomaly::{AnomalyTag, MetricSnapshot};
pub use campaign::{AdRow, AffiliateRow, CampaignRecord, DerivedMetrics};
pub use daily_metric::{DailyCampaignMetric, MetricKey};
pub use decimal::Decimal;
pub use decision::Decision;
pub use primitives::{MerchantId, PlatformId, UserId};
pub use table::{IngestReport, RawTable, RowView};
pub use transaction::{NormalizedTransaction, TxStatus};
