pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod orchestration;

pub use config::{Config, EngineConfig};
pub use datasource::{DataSourceError, MockSyncSource, SyncSource};
pub use db::{init_db, Repository};
pub use domain::{
    AdRow, AffiliateRow, AnomalyTag, CampaignRecord, DailyCampaignMetric, Decimal, Decision,
    DerivedMetrics, MerchantId, NormalizedTransaction, PlatformId, RawTable, TxStatus, UserId,
};
pub use error::AppError;
pub use orchestration::{analyze, AnalysisReport, Analyzer};
