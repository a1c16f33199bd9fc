// lopdf helper - Pure Rust PDF operations
use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};

use super::{PdfBackend, PdfDocument};
use crate::types::{ExportError, Result};

/// Load a PDF document using lopdf
pub fn load_pdf(path: &Path) -> Result<Document> {
    Document::load(path).map_err(|e| ExportError::pdf(path, e))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;

    fn open(&self, path: &Path) -> Result<LopdfDocument> {
        let document = load_pdf(path)?;
        // get_pages is keyed by 1-based page number
        let pages = document.get_pages().into_iter().collect();
        Ok(LopdfDocument {
            path: path.to_path_buf(),
            document,
            pages,
        })
    }
}

pub struct LopdfDocument {
    path: PathBuf,
    document: Document,
    pages: Vec<(u32, ObjectId)>,
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let (page_number, _) = self.pages.get(index).ok_or_else(|| {
            ExportError::pdf(
                &self.path,
                format!("page {} out of range ({} pages)", index + 1, self.pages.len()),
            )
        })?;
        self.document
            .extract_text(&[*page_number])
            .map_err(|e| ExportError::pdf(&self.path, format!("page {}: {}", page_number, e)))
    }
}
