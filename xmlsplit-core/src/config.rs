//! Split configuration
//!
//! [`SplitConfig`] is immutable once built. The builder validates every
//! setting and resolves the input location to a single file, so a splitter
//! holding a config never has to second-guess it.

use crate::error::{Result, SplitError};
use crate::input::{resolve_input, InputSelection, DEFAULT_INPUT_PATTERN};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default configuration constants
pub mod defaults {
    /// Bytes per configured megabyte
    pub const BYTES_PER_MB: u64 = 1024 * 1024;

    /// Default chunk budget in megabytes
    pub const MAX_CHUNK_MB: u64 = 50;

    /// Envelope root used when the source root is itself a repeating element
    pub const FALLBACK_ENVELOPE_ROOT: &str = "chunk";
}

/// How a chunk's payload is laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkLayout {
    /// XML declaration plus an envelope root around the payload, so every
    /// chunk is a standalone well-formed document
    #[default]
    Document,
    /// Bare concatenation of element serializations
    Fragment,
}

impl ChunkLayout {
    /// Name used in settings files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkLayout::Document => "document",
            ChunkLayout::Fragment => "fragment",
        }
    }
}

impl FromStr for ChunkLayout {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(ChunkLayout::Document),
            "fragment" => Ok(ChunkLayout::Fragment),
            other => Err(SplitError::Configuration(format!(
                "unknown chunk layout '{other}' (expected 'document' or 'fragment')"
            ))),
        }
    }
}

/// Convert a megabyte budget to bytes, rejecting zero and overflow
pub fn megabytes_to_bytes(mb: u64) -> Result<u64> {
    if mb == 0 {
        return Err(SplitError::Configuration(
            "max chunk size must be greater than 0 MB".into(),
        ));
    }
    mb.checked_mul(defaults::BYTES_PER_MB).ok_or_else(|| {
        SplitError::Configuration(format!("max chunk size of {mb} MB is too large"))
    })
}

/// Validated settings for one split run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitConfig {
    element: String,
    max_chunk_bytes: u64,
    input: InputSelection,
    output_dir: PathBuf,
    layout: ChunkLayout,
    envelope_root: Option<String>,
}

impl SplitConfig {
    /// Create a configuration builder
    pub fn builder() -> SplitConfigBuilder {
        SplitConfigBuilder::default()
    }

    /// Name of the repeating element
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Payload budget per chunk
    pub fn max_chunk_bytes(&self) -> u64 {
        self.max_chunk_bytes
    }

    /// Resolved input document
    pub fn input_file(&self) -> &Path {
        &self.input.path
    }

    /// How the input document was selected
    pub fn input_selection(&self) -> &InputSelection {
        &self.input
    }

    /// Directory chunk files are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Chunk layout
    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    /// Explicit envelope root name, if configured
    pub fn envelope_root(&self) -> Option<&str> {
        self.envelope_root.as_deref()
    }
}

/// Where the builder should find the input document
#[derive(Debug, Clone)]
enum InputSource {
    File(PathBuf),
    Directory { dir: PathBuf, pattern: String },
}

/// Fluent builder for [`SplitConfig`]
#[derive(Debug, Default)]
pub struct SplitConfigBuilder {
    element: Option<String>,
    max_chunk_bytes: Option<u64>,
    input: Option<InputSource>,
    output_dir: Option<PathBuf>,
    layout: ChunkLayout,
    envelope_root: Option<String>,
}

impl SplitConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the repeating element name (`Worker` or `wd:Worker`)
    pub fn element(mut self, name: impl Into<String>) -> Self {
        self.element = Some(name.into());
        self
    }

    /// Set the payload budget in bytes
    pub fn max_chunk_bytes(mut self, bytes: u64) -> Self {
        self.max_chunk_bytes = Some(bytes);
        self
    }

    /// Set the payload budget in megabytes
    pub fn max_chunk_mb(mut self, mb: u64) -> Result<Self> {
        self.max_chunk_bytes = Some(megabytes_to_bytes(mb)?);
        Ok(self)
    }

    /// Split this exact file
    pub fn input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(InputSource::File(path.into()));
        self
    }

    /// Split the single document in `dir` matching `pattern`
    pub fn input_dir(mut self, dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        self.input = Some(InputSource::Directory {
            dir: dir.into(),
            pattern: pattern.into(),
        });
        self
    }

    /// Set the output directory (created on demand)
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the chunk layout
    pub fn layout(mut self, layout: ChunkLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Override the envelope root name used by [`ChunkLayout::Document`]
    pub fn envelope_root(mut self, name: Option<String>) -> Self {
        self.envelope_root = name;
        self
    }

    /// Validate the settings and resolve the input document
    pub fn build(self) -> Result<SplitConfig> {
        let element = self
            .element
            .ok_or_else(|| SplitError::Configuration("repeating element name is required".into()))?;
        validate_name("repeating element", &element)?;

        if let Some(root) = &self.envelope_root {
            validate_name("envelope root", root)?;
        }

        let max_chunk_bytes = self
            .max_chunk_bytes
            .unwrap_or(defaults::MAX_CHUNK_MB * defaults::BYTES_PER_MB);
        if max_chunk_bytes == 0 {
            return Err(SplitError::Configuration(
                "max chunk size must be greater than 0".into(),
            ));
        }

        let output_dir = self
            .output_dir
            .ok_or_else(|| SplitError::Configuration("output directory is required".into()))?;
        if output_dir.as_os_str().is_empty() {
            return Err(SplitError::Configuration(
                "output directory must not be empty".into(),
            ));
        }

        let input = match self.input {
            Some(InputSource::File(path)) => {
                if !path.is_file() {
                    return Err(SplitError::MissingInput {
                        dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                        pattern: path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                    });
                }
                InputSelection::single(path)
            }
            Some(InputSource::Directory { dir, pattern }) => resolve_input(&dir, &pattern)?,
            None => {
                return Err(SplitError::Configuration(
                    "input file or directory is required".into(),
                ))
            }
        };

        Ok(SplitConfig {
            element,
            max_chunk_bytes,
            input,
            output_dir,
            layout: self.layout,
            envelope_root: self.envelope_root,
        })
    }
}

/// Reject names that cannot appear in a tag
fn validate_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SplitError::Configuration(format!(
            "{what} name must not be empty"
        )));
    }

    let bad = name
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/' | '"' | '\'' | '=' | '&'));
    if let Some(c) = bad {
        return Err(SplitError::Configuration(format!(
            "{what} name '{name}' contains invalid character '{c}'"
        )));
    }

    if name.starts_with(':') || name.ends_with(':') || name.matches(':').count() > 1 {
        return Err(SplitError::Configuration(format!(
            "{what} name '{name}' is not a valid qualified name"
        )));
    }

    Ok(())
}
