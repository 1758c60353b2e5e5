//! PDF page text extraction using lopdf and pdf-extract.

use lopdf::Document;
use std::path::Path;
use tracing::{debug, trace};

use super::TextSource;
use crate::error::{PdfError, Result};

/// Page text extractor backed by lopdf, with pdf-extract as a fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self
    }

    /// Load a document from bytes, decrypting empty-password PDFs.
    /// Returns the document and the bytes pdf-extract should read.
    fn load(data: Vec<u8>) -> std::result::Result<(Document, Vec<u8>), PdfError> {
        let mut doc = Document::load_mem(&data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data
        };

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }
        Ok((doc, raw_data))
    }

    /// Extract the text of every page of an in-memory PDF.
    pub fn pages_from_mem(&self, data: Vec<u8>) -> std::result::Result<Vec<String>, PdfError> {
        let (doc, raw_data) = Self::load(data)?;
        let pages = doc.get_pages();
        debug!("Loaded PDF with {} pages", pages.len());

        let texts: Vec<String> = pages
            .keys()
            .map(|page_num| match doc.extract_text(&[*page_num]) {
                Ok(text) => text,
                Err(e) => {
                    trace!("lopdf could not extract page {}: {}", page_num, e);
                    String::new()
                }
            })
            .collect();

        if texts.iter().any(|t| !t.trim().is_empty()) {
            return Ok(texts);
        }

        debug!("No per-page text, falling back to pdf-extract");
        let text = pdf_extract::extract_text_from_mem(&raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        Ok(vec![text])
    }
}

impl TextSource for PdfExtractor {
    fn pages(&self, path: &Path) -> Result<Vec<String>> {
        let data = std::fs::read(path)?;
        Ok(self.pages_from_mem(data)?)
    }
}
