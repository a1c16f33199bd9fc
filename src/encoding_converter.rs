// Re-encoding of legacy text sources (GB2312/GBK, UTF-16, ...) into UTF-8
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::CONVERTED_NAME_MARKER;
use crate::output_writer::write_artifact;
use crate::types::{ExportError, Result};

/// Text decoded from a source file
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// Some byte sequences were replaced with U+FFFD
    pub had_errors: bool,
}

/// What happened to one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// Decoded from another encoding and written as UTF-8
    Converted(&'static Encoding),
    /// Already UTF-8; written unchanged apart from a dropped BOM
    Copied,
}

/// Names like `index.utf8.htm` come from an earlier conversion run
pub fn is_converted_name(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            name.to_string_lossy()
                .to_ascii_lowercase()
                .contains(CONVERTED_NAME_MARKER)
        })
        .unwrap_or(false)
}

/// Byte-order mark wins; otherwise valid UTF-8 is taken as is and anything
/// else goes to chardetng.
pub fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, 0);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    (detector.guess(None, false), 0)
}

pub fn decode_to_utf8(bytes: &[u8]) -> DecodedText {
    let (encoding, bom_len) = detect_encoding(bytes);
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
    DecodedText {
        text: text.into_owned(),
        encoding,
        had_errors,
    }
}

/// Read `source`, decode it and write UTF-8 without BOM to `target`
pub fn convert_file(source: &Path, target: &Path) -> Result<ConvertOutcome> {
    let bytes = fs::read(source).map_err(|e| ExportError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;

    let decoded = decode_to_utf8(&bytes);
    debug!("{}: detected {}", source.display(), decoded.encoding.name());
    if decoded.had_errors {
        warn!(
            "{}: malformed {} sequences replaced",
            source.display(),
            decoded.encoding.name()
        );
    }

    write_artifact(target, &decoded.text)?;

    if decoded.encoding == UTF_8 {
        Ok(ConvertOutcome::Copied)
    } else {
        Ok(ConvertOutcome::Converted(decoded.encoding))
    }
}
