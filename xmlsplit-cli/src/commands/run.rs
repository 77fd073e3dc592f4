//! Run command implementation: split, transform, export

use super::{prepare, print_summary, GlobalArgs, SplitOverrides};
use crate::collaborators::{CsvAudit, RecordLevel, XsltCommand};
use crate::config::Settings;
use crate::error::CliError;
use crate::output::{OutputFormat, RunSummary};
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use xmlsplit_core::{ChunkLayout, Pipeline, Splitter};

/// Arguments for the run command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Settings and their overrides
    #[command(flatten)]
    pub overrides: SplitOverrides,

    /// XSLT stylesheet applied to every chunk
    #[arg(short, long, value_name = "FILE")]
    pub stylesheet: Option<PathBuf>,

    /// Skip the CSV audit
    #[arg(long)]
    pub no_export: bool,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Execute the run command
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let (settings, config) = prepare(&self.overrides, global)?;
        log::info!("Starting pipeline for {}", config.input_file().display());

        let transform = self.transform(&settings)?;
        if transform.is_none() {
            log::info!("No stylesheet configured; skipping transform");
        }
        let export = (settings.export.enabled && !self.no_export)
            .then(|| CsvAudit::new(records_for(transform.is_some(), config.layout())));

        let mut pipeline = Pipeline::new(Splitter::new(config.clone()));
        if let Some(transform) = &transform {
            pipeline = pipeline.with_transform(transform);
        }
        if let Some(export) = &export {
            pipeline = pipeline.with_export(export);
        }

        let started = Instant::now();
        let mut reporter = ProgressReporter::new(global.quiet);
        let report = pipeline
            .run(&mut reporter)
            .context("Pipeline failed")
            .inspect_err(|_| reporter.finish())?;
        log::info!("Pipeline complete");

        let summary = RunSummary::new(
            &config,
            reporter.chunks(),
            report,
            started.elapsed().as_millis(),
        );
        print_summary(self.format, &summary)
    }

    /// XSLT step from flags and settings, checked before any chunk is written
    fn transform(&self, settings: &Settings) -> Result<Option<XsltCommand>> {
        let stylesheet = match self
            .stylesheet
            .clone()
            .or_else(|| settings.transform.stylesheet.clone())
        {
            Some(path) => path,
            None => return Ok(None),
        };
        if !stylesheet.is_file() {
            return Err(CliError::StylesheetNotFound(stylesheet.display().to_string()).into());
        }

        Ok(Some(XsltCommand::new(
            settings.transform.program.clone(),
            settings.transform.args.clone(),
            stylesheet,
        )))
    }
}

/// Transform outputs are single documents; raw chunks follow the layout
fn records_for(transformed: bool, layout: ChunkLayout) -> RecordLevel {
    if transformed {
        RecordLevel::RootChildren
    } else {
        RecordLevel::for_layout(layout)
    }
}
