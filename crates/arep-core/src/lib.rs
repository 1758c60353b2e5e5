//! Core library for annual report data extraction.
//!
//! This crate provides:
//! - Numeric cell normalization and fiscal year resolution
//! - Keyword-driven metric location with scale reconciliation
//! - Derived metrics (USD conversion, gross profit margin)
//! - Top-twenty shareholder and rights issue extraction
//! - An orchestrator merging overlapping annual reports per fiscal year

pub mod error;
pub mod models;
pub mod pdf;
pub mod extract;

pub use error::{ArepError, ExtractionError, NumericError, PdfError, Result};
pub use models::config::ArepConfig;
pub use models::records::{
    ExtractionOutput, FiscalYear, Metric, MetricRecord, Provenance, RightsIssueRecord,
    ScaleTag, ShareholderRecord,
};
pub use models::table::RawTable;
pub use pdf::{
    FallbackTableSource, JsonTableSource, LayoutTableDetector, PdfExtractor, TableSource,
    TextSource,
};
pub use extract::{
    DerivedMetricsCalculator, ExtractionOrchestrator, MetricLocator, RightsIssueExtractor,
    ShareholderExtractor,
};
