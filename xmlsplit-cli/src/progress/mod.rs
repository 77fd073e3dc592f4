//! Progress reporting module

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use xmlsplit_core::{ChunkSummary, InputSelection, LogObserver, SplitObserver};

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {prefix:.cyan} {pos} elements {msg}";

/// Spinner for a split run.
///
/// Also forwards every event to [`LogObserver`] and keeps the summaries of
/// closed chunks for the final report.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    quiet: bool,
    log: LogObserver,
    chunks: Vec<ChunkSummary>,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new(quiet: bool) -> Self {
        Self {
            progress_bar: None,
            quiet,
            log: LogObserver,
            chunks: Vec::new(),
        }
    }

    /// Summaries of the chunks closed so far
    pub fn chunks(&self) -> &[ChunkSummary] {
        &self.chunks
    }

    /// Remove the spinner, if any
    pub fn finish(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn start_spinner(&mut self, input: &Path) {
        if self.quiet {
            return;
        }

        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let pb = ProgressBar::new_spinner().with_style(style);
        pb.set_message(
            input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));

        self.progress_bar = Some(pb);
    }

    /// Run `f` with the spinner hidden so log lines are not torn
    fn suspend<F: FnOnce(&mut LogObserver)>(&mut self, f: F) {
        match &self.progress_bar {
            Some(pb) => pb.suspend(|| f(&mut self.log)),
            None => f(&mut self.log),
        }
    }
}

impl SplitObserver for ProgressReporter {
    fn input_selected(&mut self, selection: &InputSelection) {
        self.log.input_selected(selection);
        self.start_spinner(&selection.path);
    }

    fn chunk_opened(&mut self, index: usize, path: &Path) {
        self.log.chunk_opened(index, path);
        if let Some(pb) = &self.progress_bar {
            pb.set_prefix(format!("chunk {index}"));
        }
    }

    fn element_written(&mut self, ordinal: usize, bytes: usize) {
        self.log.element_written(ordinal, bytes);
        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
        }
    }

    fn oversized_element(&mut self, ordinal: usize, bytes: usize, max_bytes: u64) {
        self.suspend(|log| log.oversized_element(ordinal, bytes, max_bytes));
    }

    fn chunk_closed(&mut self, summary: &ChunkSummary) {
        self.log.chunk_closed(summary);
        self.chunks.push(summary.clone());
    }

    fn finished(&mut self, chunks: &[PathBuf], elements: usize) {
        self.finish();
        self.log.finished(chunks, elements);
    }

    fn stage_started(&mut self, stage: &str, input: &Path) {
        self.log.stage_started(stage, input);
    }

    fn stage_completed(&mut self, stage: &str, input: &Path, output: &Path) {
        self.log.stage_completed(stage, input, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_reporter_has_no_spinner() {
        let mut reporter = ProgressReporter::new(true);
        reporter.input_selected(&InputSelection::single("in.xml"));
        assert!(reporter.progress_bar.is_none());
    }

    #[test]
    fn test_collects_closed_chunks() {
        let mut reporter = ProgressReporter::new(true);
        let summary = ChunkSummary {
            index: 1,
            path: PathBuf::from("out/chunk_1.xml"),
            elements: 2,
            payload_bytes: 40,
        };
        reporter.chunk_opened(1, &summary.path);
        reporter.element_written(1, 20);
        reporter.element_written(2, 20);
        reporter.chunk_closed(&summary);
        reporter.finished(&[summary.path.clone()], 2);

        assert_eq!(reporter.chunks(), &[summary]);
    }
}
