//! Ingestion of ad-platform and affiliate exports of unknown layout.
//!
//! This module provides:
//! - Text decoding and delimiter sniffing
//! - Header-row detection with garbled-header fallback
//! - Column → typed field binding for ad and affiliate rows
//! - A digest-keyed table cache interface

pub mod cache;
pub mod columns;
pub mod header;
pub mod reader;

use thiserror::Error;

pub use cache::{ingest_cached, InMemoryTableCache, TableCache};
pub use columns::{ad_rows, affiliate_rows, ColumnBinding, AD_FIELDS, AFFILIATE_FIELDS};
pub use reader::ingest;

/// Input that cannot be turned into a table at all.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input is empty")]
    Empty,
    #[error("unreadable delimited text: {0}")]
    Csv(String),
}
