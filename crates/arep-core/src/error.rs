//! Error types for the arep-core library.

use thiserror::Error;

/// Main error type for the arep library.
#[derive(Error, Debug)]
pub enum ArepError {
    /// Document processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Record extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Table sidecar or config (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to reading source documents.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Structural failures while extracting a record block from a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The section marker does not occur in the document text.
    #[error("section marker not found: {0}")]
    MarkerNotFound(String),

    /// No line after the marker carries a year.
    #[error("no year header line after section marker")]
    NoYearHeader,

    /// The header line carries fewer than two years.
    #[error("header line has {found} year columns, expected 2")]
    MissingYearColumns { found: usize },

    /// Fewer data rows than a complete block requires.
    #[error("only {found} of {required} rows found")]
    IncompleteBlock { found: usize, required: usize },
}

/// Reason a cell did not yield a number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    /// The cell is blank.
    #[error("empty cell")]
    Empty,

    /// Nothing numeric is left once symbols and words are stripped.
    #[error("no numeric content")]
    NoDigits,

    /// The numeric residual does not parse as a number.
    #[error("malformed number: {0}")]
    Malformed(String),

    /// The parsed magnitude is implausibly large.
    #[error("value out of bounds: {0}")]
    OutOfBounds(f64),
}

/// Result type for the arep library.
pub type Result<T> = std::result::Result<T, ArepError>;
