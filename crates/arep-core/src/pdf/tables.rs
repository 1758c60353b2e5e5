//! Table sources: layout detection over page text and JSON sidecars.

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::{document_name, TableSource, TextSource};
use crate::error::Result;
use crate::extract::rules::patterns::CELL_GAP;
use crate::models::table::RawTable;

/// Minimum lines (header included) for a group to count as a table.
const MIN_TABLE_LINES: usize = 2;

/// Detects tables in laid-out page text. Consecutive lines that split into
/// two or more cells on wide gaps form a table; its first line is the header.
pub struct LayoutTableDetector<S> {
    text: S,
}

impl<S: TextSource> LayoutTableDetector<S> {
    pub fn new(text: S) -> Self {
        Self { text }
    }

    /// Detect tables in already extracted pages.
    pub fn detect(&self, document: &str, pages: &[String]) -> Vec<RawTable> {
        let mut tables = Vec::new();

        for (page_idx, page) in pages.iter().enumerate() {
            let mut group: Vec<Vec<String>> = Vec::new();
            for line in page.lines() {
                let cells = split_cells(line);
                if cells.len() >= 2 {
                    group.push(cells);
                } else {
                    flush(&mut group, document, page_idx, &mut tables);
                }
            }
            flush(&mut group, document, page_idx, &mut tables);
        }

        debug!("Detected {} tables in {}", tables.len(), document);
        tables
    }
}

impl<S: TextSource> TableSource for LayoutTableDetector<S> {
    fn tables(&self, path: &Path) -> Result<Vec<RawTable>> {
        let pages = self.text.pages(path)?;
        Ok(self.detect(&document_name(path), &pages))
    }
}

fn split_cells(line: &str) -> Vec<String> {
    CELL_GAP
        .split(line.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn flush(group: &mut Vec<Vec<String>>, document: &str, page_idx: usize, tables: &mut Vec<RawTable>) {
    if group.len() >= MIN_TABLE_LINES {
        let mut rows = std::mem::take(group);
        let header = rows.remove(0);
        trace!("Table on page {} with {} rows", page_idx + 1, rows.len());
        let mut table = RawTable::new(document, header, rows);
        table.page = Some(page_idx as u32 + 1);
        tables.push(table);
    }
    group.clear();
}

/// Reads tables produced by an external detector from `<stem>.tables.json`
/// next to the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTableSource;

impl JsonTableSource {
    pub fn new() -> Self {
        Self
    }

    /// Sidecar location for a document.
    pub fn sidecar_path(path: &Path) -> PathBuf {
        path.with_extension("tables.json")
    }
}

impl TableSource for JsonTableSource {
    fn tables(&self, path: &Path) -> Result<Vec<RawTable>> {
        let content = std::fs::read_to_string(Self::sidecar_path(path))?;
        let mut tables: Vec<RawTable> = serde_json::from_str(&content)?;

        let name = document_name(path);
        for table in tables.iter_mut().filter(|t| t.document.is_empty()) {
            table.document = name.clone();
        }
        debug!("Loaded {} sidecar tables for {}", tables.len(), name);
        Ok(tables)
    }
}

/// Uses the JSON sidecar when one exists, otherwise layout detection.
pub struct FallbackTableSource<S> {
    sidecar: JsonTableSource,
    layout: LayoutTableDetector<S>,
}

impl<S: TextSource> FallbackTableSource<S> {
    pub fn new(text: S) -> Self {
        Self {
            sidecar: JsonTableSource::new(),
            layout: LayoutTableDetector::new(text),
        }
    }
}

impl<S: TextSource> TableSource for FallbackTableSource<S> {
    fn tables(&self, path: &Path) -> Result<Vec<RawTable>> {
        if JsonTableSource::sidecar_path(path).is_file() {
            return self.sidecar.tables(path);
        }
        self.layout.tables(path)
    }
}
