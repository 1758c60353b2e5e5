//! Rule-based field extractors for annual report text.

pub mod patterns;
pub mod numeric;
pub mod years;
pub mod scale;
pub mod rights;

pub use numeric::{clean_numeric, parse_numeric, unit_multiplier, NumericNormalizer};
pub use years::{DocumentYearResolver, TableYearResolver, YearResolution, YearSource};
pub use scale::{row_scale_multiplier, Reconciled, ScaleCandidate, ScaleReconciler};
pub use rights::{PriceExtractor, RatioExtractor, RightsRatio};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field. Defaults to the single match.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.extract(text).into_iter().collect()
    }
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
