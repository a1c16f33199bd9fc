// Export orchestration: versions -> PDFs -> text files
use chrono::Local;
use std::path::Path;
use tracing::{debug, error, info};

use crate::config::{DirMapping, ExportConfig, TIMESTAMP_FORMAT};
use crate::discovery::{find_files_with_extensions, find_pdf_files, find_version_directories};
use crate::encoding_converter::{convert_file, is_converted_name, ConvertOutcome};
use crate::output_writer::{mirror_path, output_path_for, render_artifact, write_artifact};
use crate::pdf_extraction::{extract_document_text, PdfBackend};
use crate::types::{CancelToken, ExportError, FailureStage, FileFailure, Result, RunSummary};

type Clock = Box<dyn Fn() -> String + Send + Sync>;

fn local_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub struct Exporter<B: PdfBackend> {
    config: ExportConfig,
    backend: B,
    clock: Clock,
}

impl<B: PdfBackend> Exporter<B> {
    pub fn new(config: ExportConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            clock: Box::new(local_timestamp),
        }
    }

    /// Replace the timestamp written into each header
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Process every version directory under the root. Per-file problems are
    /// recorded in the summary; only an unreadable root is an error.
    pub fn run(&self, cancel: &CancelToken) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        info!("root directory: {}", self.config.root.display());

        let version_dirs =
            find_version_directories(&self.config.root, &self.config.version_prefix)?;
        summary.versions_found = version_dirs.len();

        if version_dirs.is_empty() {
            info!(
                "no version directories matching '{}*' under {}",
                self.config.version_prefix,
                self.config.root.display()
            );
            return Ok(summary);
        }

        let names: Vec<_> = version_dirs
            .iter()
            .filter_map(|dir| dir.file_name())
            .map(|name| name.to_string_lossy())
            .collect();
        info!("found version directories: {}", names.join(", "));

        for version_dir in &version_dirs {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }
            if self.config.task.exports_pdf() {
                self.process_version(version_dir, &mut summary, cancel);
            }
            if self.config.task.converts_text() && !summary.interrupted {
                self.convert_version(version_dir, &mut summary, cancel);
            }
        }

        if self.config.task.exports_pdf() {
            info!(
                "export finished: {} of {} PDF files written, {} failed",
                summary.pdfs_exported,
                summary.pdfs_found,
                summary.failed()
            );
        }
        if self.config.task.converts_text() {
            info!(
                "conversion finished: {} re-encoded, {} already UTF-8, {} skipped",
                summary.text_files_converted, summary.text_files_copied, summary.text_files_skipped
            );
        }
        Ok(summary)
    }

    fn process_version(&self, version_dir: &Path, summary: &mut RunSummary, cancel: &CancelToken) {
        let version_name = display_name(version_dir);
        info!("processing version directory {}", version_name);

        let source_root = self.config.source_dir(version_dir);
        if !source_root.is_dir() {
            info!(
                "{}: no {} directory, skipping",
                version_name,
                self.config.source_subdir.display()
            );
            summary.versions_skipped += 1;
            return;
        }

        let pdf_files = find_pdf_files(&source_root);
        if pdf_files.is_empty() {
            info!(
                "{}: no PDF files under {}, skipping",
                version_name,
                self.config.source_subdir.display()
            );
            summary.versions_skipped += 1;
            return;
        }

        info!("{}: found {} PDF files", version_name, pdf_files.len());
        for pdf in &pdf_files {
            let shown = pdf.strip_prefix(version_dir).unwrap_or(pdf.as_path());
            debug!("  {}", shown.display());
        }
        summary.pdfs_found += pdf_files.len();

        for pdf in &pdf_files {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                return;
            }
            self.process_pdf(pdf, version_dir, &source_root, summary, cancel);
            if summary.interrupted {
                return;
            }
        }
    }

    fn process_pdf(
        &self,
        pdf: &Path,
        version_dir: &Path,
        source_root: &Path,
        summary: &mut RunSummary,
        cancel: &CancelToken,
    ) {
        let file_name = display_name(pdf);
        debug!("extracting {}", pdf.display());

        let extracted = match extract_document_text(&self.backend, pdf, cancel) {
            Ok(extracted) => extracted,
            Err(ExportError::Cancelled) => {
                info!("stopped while extracting {}, nothing written", file_name);
                summary.interrupted = true;
                return;
            }
            Err(e) => {
                error!("failed to extract {}: {}", pdf.display(), e);
                summary.failures.push(FileFailure {
                    path: pdf.to_path_buf(),
                    stage: FailureStage::Extract,
                    message: e.to_string(),
                });
                return;
            }
        };
        info!("extracted {} ({} pages)", file_name, extracted.page_count);

        let written = output_path_for(pdf, version_dir, source_root, &self.config.output_subdir)
            .and_then(|target| {
                let contents = render_artifact(&file_name, &(self.clock)(), &extracted.body);
                write_artifact(&target, &contents).map(|()| target)
            });

        match written {
            Ok(target) => {
                let shown = target.strip_prefix(version_dir).unwrap_or(target.as_path());
                info!("saved {}", shown.display());
                summary.pdfs_exported += 1;
                summary.pages_extracted += extracted.page_count;
            }
            Err(e) => {
                error!("failed to save text for {}: {}", pdf.display(), e);
                summary.failures.push(FileFailure {
                    path: pdf.to_path_buf(),
                    stage: FailureStage::Write,
                    message: e.to_string(),
                });
            }
        }
    }

    fn convert_version(&self, version_dir: &Path, summary: &mut RunSummary, cancel: &CancelToken) {
        for mapping in &self.config.convert_mappings {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                return;
            }
            self.convert_mapping(version_dir, mapping, summary, cancel);
        }
    }

    fn convert_mapping(
        &self,
        version_dir: &Path,
        mapping: &DirMapping,
        summary: &mut RunSummary,
        cancel: &CancelToken,
    ) {
        let version_name = display_name(version_dir);
        let source_root = version_dir.join(&mapping.source);
        if !source_root.is_dir() {
            info!("{}: no {} directory, skipping", version_name, mapping.source.display());
            return;
        }
        let target_root = version_dir.join(&mapping.target);

        let files = find_files_with_extensions(&source_root, &self.config.convert_extensions);
        info!(
            "{}: {} text files under {}",
            version_name,
            files.len(),
            mapping.source.display()
        );
        summary.text_files_found += files.len();

        for file in &files {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                return;
            }
            if is_converted_name(file) {
                debug!("already converted, skipping {}", file.display());
                summary.text_files_skipped += 1;
                continue;
            }

            let outcome = mirror_path(file, &source_root, &target_root)
                .and_then(|target| convert_file(file, &target));
            match outcome {
                Ok(ConvertOutcome::Converted(encoding)) => {
                    debug!("converted {} from {}", file.display(), encoding.name());
                    summary.text_files_converted += 1;
                }
                Ok(ConvertOutcome::Copied) => {
                    debug!("copied {} (already UTF-8)", file.display());
                    summary.text_files_copied += 1;
                }
                Err(e) => {
                    error!("failed to convert {}: {}", file.display(), e);
                    summary.failures.push(FileFailure {
                        path: file.to_path_buf(),
                        stage: FailureStage::Convert,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
