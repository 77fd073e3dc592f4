//! Run summary formatting

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use xmlsplit_core::{ChunkSummary, PipelineReport, SplitConfig};

pub mod json;
pub mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

/// Supported summary formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// One JSON object
    Json,
}

/// Trait for summary formatters
pub trait OutputFormatter {
    /// Write the summary of one run
    fn write_summary(&mut self, summary: &RunSummary) -> Result<()>;
}

/// One chunk in a summary
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChunkRecord {
    /// 1-based chunk index
    pub index: usize,
    /// Chunk file
    pub path: PathBuf,
    /// Elements in the chunk
    pub elements: usize,
    /// Payload bytes
    pub bytes: u64,
}

impl From<&ChunkSummary> for ChunkRecord {
    fn from(summary: &ChunkSummary) -> Self {
        Self {
            index: summary.index,
            path: summary.path.clone(),
            elements: summary.elements,
            bytes: summary.payload_bytes,
        }
    }
}

/// What a `split` or `run` invocation produced
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    /// Document that was split
    pub input: PathBuf,
    /// Files that matched the input pattern
    pub candidates: usize,
    /// Repeating element name
    pub element: String,
    /// Payload budget per chunk
    pub max_chunk_bytes: u64,
    /// Chunk layout name
    pub layout: &'static str,
    /// Chunks in creation order
    pub chunks: Vec<ChunkRecord>,
    /// Total elements written
    pub elements: usize,
    /// Transform outputs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transformed: Vec<PathBuf>,
    /// Export outputs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exported: Vec<PathBuf>,
    /// Wall time in milliseconds
    pub elapsed_ms: u128,
}

impl RunSummary {
    /// Summary of a finished run
    pub fn new(
        config: &SplitConfig,
        chunks: &[ChunkSummary],
        report: PipelineReport,
        elapsed_ms: u128,
    ) -> Self {
        let chunks: Vec<ChunkRecord> = chunks.iter().map(ChunkRecord::from).collect();
        Self {
            input: config.input_file().to_path_buf(),
            candidates: config.input_selection().candidates,
            element: config.element().to_string(),
            max_chunk_bytes: config.max_chunk_bytes(),
            layout: config.layout().as_str(),
            elements: chunks.iter().map(|c| c.elements).sum(),
            chunks,
            transformed: report.transformed,
            exported: report.exported,
            elapsed_ms,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn sample_summary() -> RunSummary {
        RunSummary {
            input: PathBuf::from("data/input/workers.xml"),
            candidates: 1,
            element: "Worker".to_string(),
            max_chunk_bytes: 1024,
            layout: "document",
            chunks: vec![
                ChunkRecord {
                    index: 1,
                    path: PathBuf::from("out/chunk_1.xml"),
                    elements: 3,
                    bytes: 900,
                },
                ChunkRecord {
                    index: 2,
                    path: PathBuf::from("out/chunk_2.xml"),
                    elements: 1,
                    bytes: 300,
                },
            ],
            elements: 4,
            transformed: Vec::new(),
            exported: Vec::new(),
            elapsed_ms: 12,
        }
    }
}
