//! Raw table grids produced by table detection.

use serde::{Deserialize, Serialize};

/// A grid of text cells from one document page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Originating document name.
    #[serde(default)]
    pub document: String,

    /// Page number (1-indexed), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Column header cells.
    #[serde(default)]
    pub header: Vec<String>,

    /// Body rows.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a table from a header row and body rows.
    pub fn new(document: impl Into<String>, header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            document: document.into(),
            page: None,
            header,
            rows,
        }
    }

    /// Build from string slices, mostly for tests and sidecar fixtures.
    pub fn from_cells(document: &str, header: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            document,
            header.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Header followed by body rows.
    pub fn all_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        std::iter::once(&self.header)
            .filter(|h| !h.is_empty())
            .chain(self.rows.iter())
    }

    /// Every cell, header included.
    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.all_rows().flat_map(|r| r.iter().map(String::as_str))
    }

    /// All cells joined with spaces, row by row.
    pub fn flattened_text(&self) -> String {
        self.all_rows()
            .map(|r| r.join(" "))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Header plus the first `n` body rows, lowercased.
    pub fn head_text(&self, n: usize) -> String {
        let header_rows = usize::from(!self.header.is_empty());
        self.all_rows()
            .take(n + header_rows)
            .map(|r| r.join(" "))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Whether the table has no body rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
