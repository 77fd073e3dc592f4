//! Progress and diagnostics hooks for a split run
//!
//! The splitter never logs on its own. Callers inject a [`SplitObserver`]
//! and decide where the events go: nowhere ([`NoopObserver`]), the `log`
//! facade ([`LogObserver`]), a progress bar, or a test recorder.

use crate::input::InputSelection;
use std::path::{Path, PathBuf};

/// What is known about a chunk once it has been closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    /// 1-based chunk index
    pub index: usize,
    /// Final path of the chunk file
    pub path: PathBuf,
    /// Number of elements written to the chunk
    pub elements: usize,
    /// Payload bytes (element serializations only)
    pub payload_bytes: u64,
}

/// Receives events from a running split.
///
/// Every method has an empty default so implementors only pick what they
/// need.
pub trait SplitObserver {
    /// The input document has been chosen
    fn input_selected(&mut self, _selection: &InputSelection) {}

    /// A new chunk file has been opened
    fn chunk_opened(&mut self, _index: usize, _path: &Path) {}

    /// An element was written to the current chunk
    fn element_written(&mut self, _ordinal: usize, _bytes: usize) {}

    /// An element larger than the budget was written as its own chunk
    fn oversized_element(&mut self, _ordinal: usize, _bytes: usize, _max_bytes: u64) {}

    /// A chunk has been closed
    fn chunk_closed(&mut self, _summary: &ChunkSummary) {}

    /// The run finished and all chunks are in place
    fn finished(&mut self, _chunks: &[PathBuf], _elements: usize) {}

    /// A downstream stage (`transform`, `export`) is about to read `input`
    fn stage_started(&mut self, _stage: &str, _input: &Path) {}

    /// A downstream stage turned `input` into `output`
    fn stage_completed(&mut self, _stage: &str, _input: &Path, _output: &Path) {}
}

/// Observer that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SplitObserver for NoopObserver {}

/// Observer that forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SplitObserver for LogObserver {
    fn input_selected(&mut self, selection: &InputSelection) {
        if selection.is_ambiguous() {
            log::warn!(
                "{} candidate input files found; splitting {} (first in sorted order)",
                selection.candidates,
                selection.path.display()
            );
        }
        log::info!("Splitting XML: {}", selection.path.display());
    }

    fn chunk_opened(&mut self, index: usize, path: &Path) {
        log::debug!("Opened chunk {index}: {}", path.display());
    }

    fn oversized_element(&mut self, ordinal: usize, bytes: usize, max_bytes: u64) {
        log::warn!(
            "Element #{ordinal} is {bytes} bytes, over the {max_bytes} byte budget; writing it as a chunk of its own"
        );
    }

    fn chunk_closed(&mut self, summary: &ChunkSummary) {
        log::debug!(
            "Closed chunk {} ({} elements, {} bytes)",
            summary.index,
            summary.elements,
            summary.payload_bytes
        );
    }

    fn finished(&mut self, chunks: &[PathBuf], elements: usize) {
        log::info!(
            "Created {} chunk files from {} elements",
            chunks.len(),
            elements
        );
    }

    fn stage_started(&mut self, stage: &str, input: &Path) {
        log::debug!("Running {stage} on {}", input.display());
    }

    fn stage_completed(&mut self, stage: &str, _input: &Path, output: &Path) {
        log::info!("{stage}: wrote {}", output.display());
    }
}

impl<O: SplitObserver + ?Sized> SplitObserver for &mut O {
    fn input_selected(&mut self, selection: &InputSelection) {
        (**self).input_selected(selection)
    }

    fn chunk_opened(&mut self, index: usize, path: &Path) {
        (**self).chunk_opened(index, path)
    }

    fn element_written(&mut self, ordinal: usize, bytes: usize) {
        (**self).element_written(ordinal, bytes)
    }

    fn oversized_element(&mut self, ordinal: usize, bytes: usize, max_bytes: u64) {
        (**self).oversized_element(ordinal, bytes, max_bytes)
    }

    fn chunk_closed(&mut self, summary: &ChunkSummary) {
        (**self).chunk_closed(summary)
    }

    fn finished(&mut self, chunks: &[PathBuf], elements: usize) {
        (**self).finished(chunks, elements)
    }

    fn stage_started(&mut self, stage: &str, input: &Path) {
        (**self).stage_started(stage, input)
    }

    fn stage_completed(&mut self, stage: &str, input: &Path, output: &Path) {
        (**self).stage_completed(stage, input, output)
    }
}
