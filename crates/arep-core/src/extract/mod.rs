//! Annual report record extraction module.

mod derived;
mod metrics;
mod orchestrator;
mod rights;
mod shareholders;
pub mod rules;

pub use derived::DerivedMetricsCalculator;
pub use metrics::{LocatedValue, MetricCandidates, MetricLocator, DEFAULT_SEARCH_RADIUS};
pub use orchestrator::{ExtractionOrchestrator, ExtractionPlan};
pub use rights::RightsIssueExtractor;
pub use shareholders::ShareholderExtractor;
