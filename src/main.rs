// UTF8TXT - Export PDF guide text for every version directory
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use utf8txt::config::{self, FileConfig, Overrides};
use utf8txt::{CancelToken, Exporter, LopdfBackend, RunSummary, Task};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory holding the version directories [default: parent of the executable's directory]
    root: Option<PathBuf>,

    /// TOML file with layout and conversion settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name prefix of version directories
    #[arg(long)]
    prefix: Option<String>,

    /// Source directory inside each version
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Output directory inside each version
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Passes to run [default: all]
    #[arg(long, value_enum)]
    task: Option<Task>,

    /// Log every file
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "utf8txt=debug" } else { "utf8txt=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        root: args.root,
        version_prefix: args.prefix,
        source_subdir: args.source_dir,
        output_subdir: args.output_dir,
        task: args.task,
    };
    let export_config = config::resolve(overrides, config::root_from_env(), file_config)
        .context("resolving configuration")?;

    let task = export_config.task;
    match task {
        Task::Pdf => println!("📄 Starting PDF text export..."),
        Task::Convert => println!("📄 Starting UTF-8 conversion..."),
        Task::All => println!("📄 Starting PDF text export and UTF-8 conversion..."),
    }
    println!("{}", "=".repeat(config::SEPARATOR_WIDTH));

    let exporter = Exporter::new(export_config, LopdfBackend);
    let cancel = CancelToken::new();

    let mut worker = {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || exporter.run(&cancel))
    };

    let summary = tokio::select! {
        joined = &mut worker => joined.context("export worker panicked")??,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            cancel.cancel();
            println!("\n⛔ Interrupted by user, stopping at the next page...");
            tokio::select! {
                joined = &mut worker => joined.context("export worker panicked")??,
                _ = tokio::signal::ctrl_c() => {
                    println!("\n⛔ Interrupted again, exiting now");
                    std::process::exit(130);
                }
            }
        }
    };

    print_summary(&summary, task);
    Ok(())
}

fn print_summary(summary: &RunSummary, task: Task) {
    println!();
    println!("{}", "=".repeat(config::SEPARATOR_WIDTH));
    if summary.versions_found == 0 {
        println!("No version directories found");
        return;
    }

    println!(
        "Versions: {} found, {} skipped",
        summary.versions_found, summary.versions_skipped
    );
    if task.exports_pdf() {
        println!(
            "Extracted {} of {} PDF files ({} pages)",
            summary.pdfs_exported, summary.pdfs_found, summary.pages_extracted
        );
    }
    if task.converts_text() {
        println!(
            "Converted {} text files, {} already UTF-8, {} skipped",
            summary.text_files_converted, summary.text_files_copied, summary.text_files_skipped
        );
    }
    if !summary.failures.is_empty() {
        println!("❌ {} files failed:", summary.failed());
        for failure in &summary.failures {
            println!("   [{}] {}: {}", failure.stage, failure.path.display(), failure.message);
        }
    }

    if summary.interrupted {
        println!("⛔ Export stopped early");
    } else {
        println!("✅ UTF-8 text export complete!");
    }
}
