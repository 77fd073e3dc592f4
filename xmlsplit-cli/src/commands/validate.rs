//! Validate command implementation

use super::{display_or, GlobalArgs};
use crate::config::{Settings, DEFAULT_SETTINGS_FILE};
use crate::error::CliError;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Settings file to validate
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        println!("Validating settings: {}", self.config.display());

        let settings = Settings::load(&self.config)?;
        global.init_logging(&settings.logging.level);

        match self.check(&settings) {
            Ok(()) => Ok(()),
            Err(e) => {
                println!("✗ Settings are invalid!");
                println!("  Error: {e:#}");
                Err(anyhow::anyhow!("Validation failed: {e:#}"))
            }
        }
    }

    fn check(&self, settings: &Settings) -> Result<()> {
        let config = settings.split_config()?;

        let stylesheet = settings.transform.stylesheet.as_deref();
        if let Some(path) = stylesheet {
            if !path.is_file() {
                return Err(CliError::StylesheetNotFound(path.display().to_string()).into());
            }
        }

        println!("✓ Settings are valid!");
        println!("  Element: {}", config.element());
        println!("  Input: {}", config.input_file().display());
        if config.input_selection().is_ambiguous() {
            println!(
                "  ({} candidates matched; the first in sorted order will be used)",
                config.input_selection().candidates
            );
        }
        println!("  Output: {}", config.output_dir().display());
        println!(
            "  Budget: {} bytes per chunk ({} layout)",
            config.max_chunk_bytes(),
            config.layout().as_str()
        );
        println!("  Stylesheet: {}", display_or(stylesheet, "none"));
        Ok(())
    }
}
