//! Document collaborators: page text and table grids.

mod extractor;
mod tables;

pub use extractor::PdfExtractor;
pub use tables::{FallbackTableSource, JsonTableSource, LayoutTableDetector};

use std::path::Path;

use crate::error::Result;
use crate::models::table::RawTable;

/// Supplies the text of each page of a document, in page order.
pub trait TextSource {
    fn pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// Supplies the tables found in a document.
pub trait TableSource {
    fn tables(&self, path: &Path) -> Result<Vec<RawTable>>;
}

impl<T: TextSource + ?Sized> TextSource for &T {
    fn pages(&self, path: &Path) -> Result<Vec<String>> {
        (**self).pages(path)
    }
}

impl<T: TableSource + ?Sized> TableSource for &T {
    fn tables(&self, path: &Path) -> Result<Vec<RawTable>> {
        (**self).tables(path)
    }
}

/// Document file name used for lookups and provenance.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
