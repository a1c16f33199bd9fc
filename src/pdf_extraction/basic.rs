// TEXT LAYER EXTRACTION - one marker-prefixed block per page
use std::fmt::Write as _;
use std::path::Path;

use super::{PdfBackend, PdfDocument};
use crate::types::{CancelToken, Result};

/// Text of a whole document, ready to be written after the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub body: String,
    pub page_count: usize,
}

/// Marker line preceding each page; `page_number` is 1-based
pub fn page_marker(page_number: usize) -> String {
    format!("--- page {} ---", page_number)
}

/// Extract every page in order. The document is dropped before returning,
/// whether a page fails or `cancel` fires between pages.
pub fn extract_document_text<B: PdfBackend>(
    backend: &B,
    pdf_path: &Path,
    cancel: &CancelToken,
) -> Result<ExtractedText> {
    let document = backend.open(pdf_path)?;
    let page_count = document.page_count();

    let mut body = String::new();
    for index in 0..page_count {
        cancel.check()?;
        let text = document.page_text(index)?;
        // Each block ends in exactly one blank line
        let text = text.trim_end_matches(['\r', '\n']);
        // Writing into a String cannot fail
        let _ = write!(body, "{}\n{}\n\n", page_marker(index + 1), text);
    }

    Ok(ExtractedText { body, page_count })
}
