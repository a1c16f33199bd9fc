// Core types for utf8txt
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Error types
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("PDF error in {}: {message}", path.display())]
    Pdf { path: PathBuf, message: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not inside the source tree {}", path.display(), source_root.display())]
    OutsideSource { path: PathBuf, source_root: PathBuf },

    #[error("cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl ExportError {
    pub fn pdf(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        ExportError::Pdf {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Which step of the per-file pipeline failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Extract,
    Write,
    Convert,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Extract => f.write_str("extract"),
            FailureStage::Write => f.write_str("write"),
            FailureStage::Convert => f.write_str("convert"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub stage: FailureStage,
    pub message: String,
}

/// Counters for one export run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub versions_found: usize,
    pub versions_skipped: usize,
    pub pdfs_found: usize,
    pub pdfs_exported: usize,
    pub pages_extracted: usize,
    pub text_files_found: usize,
    pub text_files_converted: usize,
    pub text_files_copied: usize,
    pub text_files_skipped: usize,
    pub failures: Vec<FileFailure>,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }
}

/// Shared stop request, checked between files and between pages
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once a stop was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ExportError::Cancelled)
        } else {
            Ok(())
        }
    }
}
