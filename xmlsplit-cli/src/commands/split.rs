//! Split command implementation

use super::{prepare, print_summary, GlobalArgs, SplitOverrides};
use crate::output::{OutputFormat, RunSummary};
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use clap::Args;
use std::time::Instant;
use xmlsplit_core::{PipelineReport, Splitter};

/// Arguments for the split command
#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Settings and their overrides
    #[command(flatten)]
    pub overrides: SplitOverrides,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl SplitArgs {
    /// Execute the split command
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let (_settings, config) = prepare(&self.overrides, global)?;
        log::info!("Starting split of {}", config.input_file().display());

        let started = Instant::now();
        let mut reporter = ProgressReporter::new(global.quiet);
        let splitter = Splitter::new(config.clone());
        let chunks = splitter
            .split_with(&mut reporter)
            .with_context(|| format!("Failed to split {}", config.input_file().display()))
            .inspect_err(|_| reporter.finish())?;

        let report = PipelineReport {
            chunks,
            ..Default::default()
        };
        let summary = RunSummary::new(
            &config,
            reporter.chunks(),
            report,
            started.elapsed().as_millis(),
        );
        print_summary(self.format, &summary)
    }
}
