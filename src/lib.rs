// utf8txt - export the text layer of versioned PDF guides as UTF-8 files
pub mod config;
pub mod discovery;
pub mod encoding_converter;
pub mod exporter;
pub mod output_writer;
pub mod pdf_extraction;
pub mod types;

pub use config::{ExportConfig, Task};
pub use exporter::Exporter;
pub use pdf_extraction::{LopdfBackend, PdfBackend, PdfDocument};
pub use types::{CancelToken, ExportError, RunSummary};
