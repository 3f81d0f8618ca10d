//! Analysis pipeline: the pure `analyze` composition plus the async
//! `Analyzer` that wires it to baselines, persistence and sync sources.

pub mod analysis;
pub mod analyzer;
pub mod store;

pub use analysis::{analyze, analyze_rows, AnalysisReport, Baselines, CampaignAnalysis, Diagnosis};
pub use analyzer::{AnalysisError, AnalysisRequest, AnalysisRun, Analyzer};
pub use store::{BaselineStore, InMemoryMetricStore, MetricSink, StoreError};
