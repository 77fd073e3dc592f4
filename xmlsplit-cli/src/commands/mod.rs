//! CLI command implementations

use crate::config::Settings;
use crate::error::CliResult;
use crate::logging;
use crate::output::{JsonFormatter, OutputFormat, OutputFormatter, RunSummary, TextFormatter};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use xmlsplit_core::{ChunkLayout, SplitConfig};

pub mod generate_config;
pub mod run;
pub mod split;
pub mod validate;

/// Split large XML exports into size-bounded chunk files
#[derive(Debug, Parser)]
#[command(name = "xmlsplit", version, about, long_about = None)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Execute the selected command
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            Commands::Split(args) => args.execute(&self.global),
            Commands::Run(args) => args.execute(&self.global),
            Commands::GenerateConfig(args) => args.execute(&self.global),
            Commands::Validate(args) => args.execute(&self.global),
        }
    }
}

/// Flags accepted by every command
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Install the logger with the level implied by flags and settings
    pub fn init_logging(&self, configured: &str) {
        logging::init(logging::level_for(self.verbose, configured));
    }
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split the input document into chunk files
    Split(split::SplitArgs),

    /// Split, transform every chunk with XSLT and write CSV audits
    Run(run::RunArgs),

    /// Write a settings file template
    GenerateConfig(generate_config::GenerateConfigArgs),

    /// Check a settings file and resolve its input
    Validate(validate::ValidateArgs),
}

/// Chunk layout as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LayoutArg {
    /// Standalone documents with an envelope root
    Document,
    /// Bare element concatenation
    Fragment,
}

impl From<LayoutArg> for ChunkLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Document => ChunkLayout::Document,
            LayoutArg::Fragment => ChunkLayout::Fragment,
        }
    }
}

/// Settings that may be overridden on the command line
#[derive(Debug, Clone, Default, Args)]
pub struct SplitOverrides {
    /// Settings file (default: ./xmlsplit.toml when present)
    #[arg(short, long, value_name = "FILE", env = "XMLSPLIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repeating element name (`Worker` or `wd:Worker`)
    #[arg(short, long, value_name = "NAME")]
    pub element: Option<String>,

    /// Payload budget per chunk in megabytes
    #[arg(short = 'm', long, value_name = "MB")]
    pub max_mb: Option<u64>,

    /// Exact payload budget per chunk in bytes
    #[arg(long, value_name = "BYTES", conflicts_with = "max_mb")]
    pub max_bytes: Option<u64>,

    /// Input file (skips the directory search)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory holding the input document
    #[arg(long, value_name = "DIR", conflicts_with = "input")]
    pub input_dir: Option<PathBuf>,

    /// Glob pattern applied inside the input directory
    #[arg(long, value_name = "PATTERN", conflicts_with = "input")]
    pub pattern: Option<String>,

    /// Directory receiving the chunks
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Chunk layout
    #[arg(short, long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Envelope root name for the document layout
    #[arg(long, value_name = "NAME")]
    pub envelope_root: Option<String>,
}

impl SplitOverrides {
    /// Load the settings file and apply the flags on top
    pub fn settings(&self) -> CliResult<Settings> {
        let mut settings = Settings::discover(self.config.as_deref())?;
        self.apply(&mut settings);
        Ok(settings)
    }

    /// Apply the flags that were given to `settings`
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(element) = &self.element {
            settings.split.element = Some(element.clone());
        }
        if let Some(mb) = self.max_mb {
            settings.split.max_file_size_mb = mb;
            settings.split.max_chunk_bytes = None;
        }
        if let Some(bytes) = self.max_bytes {
            settings.split.max_chunk_bytes = Some(bytes);
        }
        if let Some(input) = &self.input {
            settings.paths.input_file = Some(input.clone());
        }
        if let Some(dir) = &self.input_dir {
            settings.paths.input_dir = dir.clone();
            settings.paths.input_file = None;
        }
        if let Some(pattern) = &self.pattern {
            settings.paths.input_pattern = pattern.clone();
            settings.paths.input_file = None;
        }
        if let Some(dir) = &self.output_dir {
            settings.paths.output_dir = dir.clone();
        }
        if let Some(layout) = self.layout {
            settings.split.layout = ChunkLayout::from(layout).as_str().to_string();
        }
        if let Some(root) = &self.envelope_root {
            settings.split.envelope_root = Some(root.clone());
        }
    }
}

/// Load settings, start logging and validate the split configuration
pub(crate) fn prepare(
    overrides: &SplitOverrides,
    global: &GlobalArgs,
) -> CliResult<(Settings, SplitConfig)> {
    let settings = overrides.settings()?;
    global.init_logging(&settings.logging.level);
    log::debug!("Effective settings: {settings:?}");

    let config = settings.split_config()?;
    Ok((settings, config))
}

/// Print `summary` to stdout in `format`
pub(crate) fn print_summary(format: OutputFormat, summary: &RunSummary) -> CliResult<()> {
    match format {
        OutputFormat::Text => TextFormatter::stdout().write_summary(summary),
        OutputFormat::Json => JsonFormatter::new(std::io::stdout()).write_summary(summary),
    }
}

/// Display helper for optional paths
pub(crate) fn display_or<'a>(path: Option<&'a Path>, fallback: &'a str) -> std::borrow::Cow<'a, str> {
    path.map(|p| p.to_string_lossy())
        .unwrap_or(std::borrow::Cow::Borrowed(fallback))
}
