// End-to-end export over real PDF trees built in a temp dir
mod common;

use anyhow::Result;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use common::{list_files, output_dir, source_dir, write_corrupt_pdf, write_pdf};
use utf8txt::pdf_extraction::{extract_document_text, page_marker, PdfBackend, PdfDocument};
use utf8txt::types::FailureStage;
use utf8txt::{CancelToken, ExportConfig, ExportError, Exporter, LopdfBackend, RunSummary};

const FIXED_TIME: &str = "2025-03-14 15:09:26";

fn run_export(root: &Path) -> Result<RunSummary> {
    let exporter = Exporter::new(ExportConfig::new(root), LopdfBackend)
        .with_clock(|| FIXED_TIME.to_string());
    Ok(exporter.run(&CancelToken::new())?)
}

fn header(name: &str) -> String {
    format!(
        "PDF file: {}\nExtraction time: {}\n{}\n\n",
        name,
        FIXED_TIME,
        "=".repeat(50)
    )
}

#[test]
fn two_page_pdf_is_exported_with_header_and_markers() -> Result<()> {
    let root = TempDir::new()?;
    write_pdf(&source_dir(root.path(), "v1").join("doc.pdf"), &["Hello", "World"]);

    let summary = run_export(root.path())?;
    assert!(summary.is_clean());
    assert_eq!(summary.pdfs_exported, 1);
    assert_eq!(summary.pages_extracted, 2);

    let text = fs::read_to_string(output_dir(root.path(), "v1").join("doc.txt"))?;
    let expected = format!(
        "{}--- page 1 ---\nHello\n\n--- page 2 ---\nWorld\n\n",
        header("doc.pdf")
    );
    assert_eq!(text, expected);
    Ok(())
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(7)]
fn marker_count_matches_page_count(#[case] pages: usize) -> Result<()> {
    let root = TempDir::new()?;
    let pdf = root.path().join("sample.pdf");
    let texts: Vec<String> = (1..=pages).map(|n| format!("Page{}", n)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    write_pdf(&pdf, &refs);

    assert_eq!(LopdfBackend.open(&pdf)?.page_count(), pages);

    let extracted = extract_document_text(&LopdfBackend, &pdf, &CancelToken::new())?;
    assert_eq!(extracted.page_count, pages);
    let markers: Vec<&str> = extracted
        .body
        .lines()
        .filter(|line| line.starts_with("--- page "))
        .collect();
    let expected: Vec<String> = (1..=pages).map(page_marker).collect();
    assert_eq!(markers, expected);
    Ok(())
}

#[test]
fn output_tree_mirrors_source_tree() -> Result<()> {
    let root = TempDir::new()?;
    let source = source_dir(root.path(), "v6.7.9");
    write_pdf(&source.join("intro.pdf"), &["Intro"]);
    write_pdf(&source.join("api/trader.pdf"), &["Trader"]);
    write_pdf(&source.join("api/md/quotes.pdf"), &["Quotes"]);
    fs::write(source.join("api/readme.txt"), "not a pdf")?;

    run_export(root.path())?;

    assert_eq!(
        list_files(&output_dir(root.path(), "v6.7.9")),
        [
            PathBuf::from("api/md/quotes.txt"),
            PathBuf::from("api/trader.txt"),
            PathBuf::from("intro.txt"),
        ]
    );
    Ok(())
}

#[test]
fn corrupt_pdf_does_not_block_its_siblings() -> Result<()> {
    let root = TempDir::new()?;
    let source = source_dir(root.path(), "v1");
    write_pdf(&source.join("a_good.pdf"), &["First"]);
    write_corrupt_pdf(&source.join("b_broken.pdf"));
    write_pdf(&source.join("c_good.pdf"), &["Second"]);

    let summary = run_export(root.path())?;

    assert_eq!(summary.pdfs_found, 3);
    assert_eq!(summary.pdfs_exported, 2);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.failures[0].stage, FailureStage::Extract);
    assert!(summary.failures[0].path.ends_with("b_broken.pdf"));

    let out = output_dir(root.path(), "v1");
    assert!(out.join("a_good.txt").is_file());
    assert!(out.join("c_good.txt").is_file());
    assert!(!out.join("b_broken.txt").exists());
    Ok(())
}

#[test]
fn corrupt_pdf_reports_its_path() {
    let root = TempDir::new().unwrap();
    let pdf = root.path().join("broken.pdf");
    write_corrupt_pdf(&pdf);

    match extract_document_text(&LopdfBackend, &pdf, &CancelToken::new()) {
        Err(ExportError::Pdf { path, .. }) => assert_eq!(path, pdf),
        other => panic!("expected a PDF error, got {:?}", other),
    }
}

#[test]
fn cancelled_token_aborts_extraction() {
    let root = TempDir::new().unwrap();
    let pdf = root.path().join("long.pdf");
    write_pdf(&pdf, &["One", "Two", "Three"]);

    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        extract_document_text(&LopdfBackend, &pdf, &cancel),
        Err(ExportError::Cancelled)
    ));
}

#[test]
fn legacy_text_sources_are_re_encoded_alongside_pdfs() -> Result<()> {
    let root = TempDir::new()?;
    write_pdf(&source_dir(root.path(), "v1").join("doc.pdf"), &["Guide"]);
    let chm = root.path().join("v1/chm/Original");
    fs::create_dir_all(chm.join("html"))?;
    let page = "<html><body>综合交易平台开发指南，版本说明。</body></html>\n".repeat(6);
    let (gbk, _, _) = encoding_rs::GBK.encode(&page);
    fs::write(chm.join("html/index.htm"), &gbk[..])?;
    fs::write(chm.join("toc.utf8.hhc"), "<ul></ul>")?;

    let summary = run_export(root.path())?;

    assert!(summary.is_clean());
    assert_eq!(summary.pdfs_exported, 1);
    assert_eq!(summary.text_files_converted, 1);
    assert_eq!(summary.text_files_skipped, 1);
    assert_eq!(
        fs::read_to_string(root.path().join("v1/chm/Utf8/html/index.htm"))?,
        page
    );
    assert!(!root.path().join("v1/chm/Utf8/toc.utf8.hhc").exists());
    Ok(())
}

#[test]
fn write_failure_is_contained() -> Result<()> {
    let root = TempDir::new()?;
    write_pdf(&source_dir(root.path(), "v1").join("doc.pdf"), &["One"]);
    write_pdf(&source_dir(root.path(), "v2").join("doc.pdf"), &["Two"]);
    // A plain file where v1's output directory should go
    fs::write(output_dir(root.path(), "v1"), "in the way")?;

    let summary = run_export(root.path())?;

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.failures[0].stage, FailureStage::Write);
    assert_eq!(summary.pdfs_exported, 1);
    assert!(output_dir(root.path(), "v2").join("doc.txt").is_file());
    Ok(())
}

#[test]
fn absent_or_empty_source_produces_nothing() -> Result<()> {
    let root = TempDir::new()?;
    fs::create_dir_all(root.path().join("v1/guide"))?;
    fs::create_dir_all(source_dir(root.path(), "v2").join("empty/nested"))?;
    fs::write(source_dir(root.path(), "v2").join("notes.md"), "# notes")?;

    let summary = run_export(root.path())?;

    assert_eq!(summary.versions_found, 2);
    assert_eq!(summary.versions_skipped, 2);
    assert!(summary.is_clean());
    assert!(!output_dir(root.path(), "v1").exists());
    assert!(!output_dir(root.path(), "v2").exists());
    Ok(())
}

#[test]
fn rerun_overwrites_with_identical_content() -> Result<()> {
    let root = TempDir::new()?;
    write_pdf(&source_dir(root.path(), "v1").join("doc.pdf"), &["Stable"]);
    let target = output_dir(root.path(), "v1").join("doc.txt");

    run_export(root.path())?;
    let first = fs::read(&target)?;
    run_export(root.path())?;
    let second = fs::read(&target)?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn versions_are_visited_in_literal_name_order() -> Result<()> {
    let root = TempDir::new()?;
    for version in ["v2", "v10", "v1"] {
        write_pdf(&source_dir(root.path(), version).join("doc.pdf"), &[version]);
    }
    write_corrupt_pdf(&source_dir(root.path(), "v10").join("zz.pdf"));
    write_corrupt_pdf(&source_dir(root.path(), "v2").join("zz.pdf"));
    write_corrupt_pdf(&source_dir(root.path(), "v1").join("zz.pdf"));

    let summary = run_export(root.path())?;

    let order: Vec<String> = summary
        .failures
        .iter()
        .map(|f| {
            f.path
                .strip_prefix(root.path())
                .unwrap()
                .components()
                .next()
                .unwrap()
                .as_os_str()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(order, ["v1", "v10", "v2"]);
    Ok(())
}

#[test]
fn non_version_directories_are_ignored() -> Result<()> {
    let root = TempDir::new()?;
    write_pdf(&source_dir(root.path(), "archive").join("doc.pdf"), &["Old"]);
    write_pdf(&source_dir(root.path(), "v1").join("doc.pdf"), &["New"]);

    let summary = run_export(root.path())?;

    assert_eq!(summary.versions_found, 1);
    assert!(!output_dir(root.path(), "archive").exists());
    Ok(())
}

#[test]
fn custom_layout_is_honoured() -> Result<()> {
    let root = TempDir::new()?;
    write_pdf(&root.path().join("release-1/docs/pdf/manual.pdf"), &["Manual"]);

    let mut config = ExportConfig::new(root.path());
    config.version_prefix = "release-".into();
    config.source_subdir = "docs/pdf".into();
    config.output_subdir = "docs/txt".into();
    let summary = Exporter::new(config, LopdfBackend).run(&CancelToken::new())?;

    assert_eq!(summary.pdfs_exported, 1);
    assert!(root.path().join("release-1/docs/txt/manual.txt").is_file());
    Ok(())
}
