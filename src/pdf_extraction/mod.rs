// PDF extraction module
use std::path::Path;

use crate::types::Result;

pub mod basic;
pub mod lopdf_helper;

pub use basic::{extract_document_text, page_marker, ExtractedText};
pub use lopdf_helper::LopdfBackend;

/// Opens PDF documents. Implementations wrap a concrete parsing library.
pub trait PdfBackend: Send + Sync {
    type Document: PdfDocument;

    fn open(&self, path: &Path) -> Result<Self::Document>;
}

/// An open document. Dropping it releases the underlying handle.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Text layer of the page at `index` (0-based)
    fn page_text(&self, index: usize) -> Result<String>;
}
