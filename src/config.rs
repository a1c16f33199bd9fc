// Configuration for utf8txt
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{ExportError, Result};

// Directory layout
pub const VERSION_PREFIX: &str = "v";
pub const SOURCE_SUBDIR: &str = "guide/Original";
pub const OUTPUT_SUBDIR: &str = "guide/Utf8Txt";

pub const ROOT_ENV_VAR: &str = "UTF8TXT_ROOT";

// Text re-encoding
pub const CONVERT_MAPPINGS: &[(&str, &str)] = &[
    ("chm/Original", "chm/Utf8"),
    ("api/Original", "api/Utf8"),
    ("demo/Original", "demo/Utf8"),
];
pub const CONVERT_EXTENSIONS: &[&str] = &["html", "htm", "h", "cpp", "xml", "hhc", "hhk"];
// Files already carrying this in their name were produced by a previous conversion
pub const CONVERTED_NAME_MARKER: &str = ".utf8";

// Output format
pub const SEPARATOR_WIDTH: usize = 50;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Root from environment, if set and non-empty
pub fn root_from_env() -> Option<PathBuf> {
    env::var_os(ROOT_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Parent of the directory holding the running executable
pub fn default_root() -> Result<PathBuf> {
    let exe = env::current_exe()
        .map_err(|e| ExportError::Config(format!("cannot locate executable: {}", e)))?;
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            ExportError::Config(format!("executable {} has no parent directory", exe.display()))
        })
}

/// Which passes a run performs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// PDF text export only
    Pdf,
    /// Re-encode text sources to UTF-8 only
    Convert,
    /// Both passes, PDF export first
    #[default]
    All,
}

impl Task {
    pub fn exports_pdf(self) -> bool {
        matches!(self, Task::Pdf | Task::All)
    }

    pub fn converts_text(self) -> bool {
        matches!(self, Task::Convert | Task::All)
    }
}

/// One source directory re-encoded into a target directory, both relative
/// to a version directory
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirMapping {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl DirMapping {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

pub fn default_convert_mappings() -> Vec<DirMapping> {
    CONVERT_MAPPINGS
        .iter()
        .map(|(source, target)| DirMapping::new(*source, *target))
        .collect()
}

/// Settings for one export run. Built once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub root: PathBuf,
    pub version_prefix: String,
    pub source_subdir: PathBuf,
    pub output_subdir: PathBuf,
    pub task: Task,
    pub convert_mappings: Vec<DirMapping>,
    /// Lowercase, without the leading dot
    pub convert_extensions: Vec<String>,
}

impl ExportConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            version_prefix: VERSION_PREFIX.to_string(),
            source_subdir: PathBuf::from(SOURCE_SUBDIR),
            output_subdir: PathBuf::from(OUTPUT_SUBDIR),
            task: Task::default(),
            convert_mappings: default_convert_mappings(),
            convert_extensions: CONVERT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    pub fn source_dir(&self, version_dir: &Path) -> PathBuf {
        version_dir.join(&self.source_subdir)
    }

    pub fn output_dir(&self, version_dir: &Path) -> PathBuf {
        version_dir.join(&self.output_subdir)
    }

    fn validate(mut self) -> Result<Self> {
        if self.version_prefix.is_empty() {
            return Err(ExportError::Config("version prefix must not be empty".into()));
        }
        check_pair("source", &self.source_subdir, "output", &self.output_subdir)?;
        for mapping in &self.convert_mappings {
            check_pair("convert source", &mapping.source, "convert target", &mapping.target)?;
        }

        self.convert_extensions = self
            .convert_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if self.task.converts_text() && self.convert_extensions.is_empty() {
            return Err(ExportError::Config("no file extensions to convert".into()));
        }
        Ok(self)
    }
}

fn check_pair(source_name: &str, source: &Path, target_name: &str, target: &Path) -> Result<()> {
    for (name, dir) in [(source_name, source), (target_name, target)] {
        if dir.as_os_str().is_empty() || dir.is_absolute() {
            return Err(ExportError::Config(format!(
                "{} directory must be a relative path, got {:?}",
                name, dir
            )));
        }
    }
    if source == target {
        return Err(ExportError::Config(format!(
            "{} and {} directories must differ",
            source_name, target_name
        )));
    }
    Ok(())
}

/// On-disk config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub root: Option<PathBuf>,
    pub version_prefix: Option<String>,
    pub source_subdir: Option<PathBuf>,
    pub output_subdir: Option<PathBuf>,
    pub task: Option<Task>,
    pub convert_mappings: Option<Vec<DirMapping>>,
    pub convert_extensions: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ExportError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub version_prefix: Option<String>,
    pub source_subdir: Option<PathBuf>,
    pub output_subdir: Option<PathBuf>,
    pub task: Option<Task>,
}

/// Merge sources: command line > environment > config file > defaults
pub fn resolve(
    overrides: Overrides,
    env_root: Option<PathBuf>,
    file: FileConfig,
) -> Result<ExportConfig> {
    let root = match overrides.root.or(env_root).or(file.root) {
        Some(root) => root,
        None => default_root()?,
    };

    let mut config = ExportConfig::new(root);
    if let Some(prefix) = overrides.version_prefix.or(file.version_prefix) {
        config.version_prefix = prefix;
    }
    if let Some(dir) = overrides.source_subdir.or(file.source_subdir) {
        config.source_subdir = dir;
    }
    if let Some(dir) = overrides.output_subdir.or(file.output_subdir) {
        config.output_subdir = dir;
    }
    if let Some(task) = overrides.task.or(file.task) {
        config.task = task;
    }
    if let Some(mappings) = file.convert_mappings {
        config.convert_mappings = mappings;
    }
    if let Some(extensions) = file.convert_extensions {
        config.convert_extensions = extensions;
    }
    config.validate()
}
