//! Settings file
//!
//! Every section is optional. Values missing from the file fall back to the
//! defaults below, and command-line flags are applied on top before the
//! settings are turned into a [`SplitConfig`].

use crate::error::{CliError, CliResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xmlsplit_core::config::defaults;
use xmlsplit_core::input::DEFAULT_INPUT_PATTERN;
use xmlsplit_core::{ChunkLayout, SplitConfig, SplitError};

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "xmlsplit.toml";

/// CLI settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// What to split and how large chunks may grow
    pub split: SplitSection,

    /// Where the input lives and where chunks go
    pub paths: PathsSection,

    /// XSLT step of `run`
    pub transform: TransformSection,

    /// CSV audit step of `run`
    pub export: ExportSection,

    /// Logger defaults
    pub logging: LoggingSection,
}

/// `[split]`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SplitSection {
    /// Repeating element name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    /// Budget in megabytes
    pub max_file_size_mb: u64,

    /// Exact budget in bytes; wins over `max_file_size_mb`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chunk_bytes: Option<u64>,

    /// `document` or `fragment`
    pub layout: String,

    /// Envelope root name for the document layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope_root: Option<String>,
}

impl Default for SplitSection {
    fn default() -> Self {
        Self {
            element: None,
            max_file_size_mb: defaults::MAX_CHUNK_MB,
            max_chunk_bytes: None,
            layout: ChunkLayout::default().as_str().to_string(),
            envelope_root: None,
        }
    }
}

/// `[paths]`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    /// Exact input file; wins over `input_dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file: Option<PathBuf>,

    /// Directory holding the input document
    pub input_dir: PathBuf,

    /// Glob pattern applied inside `input_dir`
    pub input_pattern: String,

    /// Directory receiving the chunks
    pub output_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            input_file: None,
            input_dir: PathBuf::from("data/input"),
            input_pattern: DEFAULT_INPUT_PATTERN.to_string(),
            output_dir: PathBuf::from("data/output"),
        }
    }
}

/// `[transform]`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSection {
    /// Stylesheet applied to every chunk; no transform when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<PathBuf>,

    /// XSLT processor executable
    pub program: String,

    /// Processor arguments with `{input}`, `{output}` and `{stylesheet}`
    /// placeholders
    pub args: Vec<String>,
}

impl Default for TransformSection {
    fn default() -> Self {
        Self {
            stylesheet: None,
            program: "xsltproc".to_string(),
            args: ["-o", "{output}", "{stylesheet}", "{input}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// `[export]`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSection {
    /// Write a CSV audit file next to every transformed chunk
    pub enabled: bool,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Default log filter when neither `-v` nor `RUST_LOG` is given
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> CliResult<Self> {
        toml::from_str(content).map_err(|e| CliError::ConfigParse(e.to_string()).into())
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.is_file() {
            return Err(CliError::ConfigNotFound(path.display().to_string()).into());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Load `path` if given, else `xmlsplit.toml` if present, else defaults
    pub fn discover(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if default.is_file() {
                    log::debug!("Using settings from {DEFAULT_SETTINGS_FILE}");
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the split settings and resolve the input document
    pub fn split_config(&self) -> xmlsplit_core::Result<SplitConfig> {
        let element = self.split.element.clone().ok_or_else(|| {
            SplitError::Configuration("[split] element is required".to_string())
        })?;
        let layout: ChunkLayout = self.split.layout.parse()?;

        let mut builder = SplitConfig::builder()
            .element(element)
            .layout(layout)
            .envelope_root(self.split.envelope_root.clone())
            .output_dir(&self.paths.output_dir);

        builder = match self.split.max_chunk_bytes {
            Some(bytes) => builder.max_chunk_bytes(bytes),
            None => builder.max_chunk_mb(self.split.max_file_size_mb)?,
        };

        builder = match &self.paths.input_file {
            Some(file) => builder.input_file(file),
            None => builder.input_dir(&self.paths.input_dir, self.paths.input_pattern.as_str()),
        };

        builder.build()
    }

    /// Render as a TOML document
    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings")
    }
}
