//! Plain text summary formatter

use super::{OutputFormatter, RunSummary};
use anyhow::Result;
use std::io::{self, Write};

/// Plain text formatter - one line per chunk
pub struct TextFormatter<W: Write> {
    writer: W,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the formatter, returning the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl TextFormatter<io::Stdout> {
    /// Create a formatter that writes to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> OutputFormatter for TextFormatter<W> {
    fn write_summary(&mut self, summary: &RunSummary) -> Result<()> {
        writeln!(self.writer, "Input: {}", summary.input.display())?;
        if summary.candidates > 1 {
            writeln!(
                self.writer,
                "  ({} candidates matched; the first in sorted order was used)",
                summary.candidates
            )?;
        }
        writeln!(
            self.writer,
            "Split on <{}>, {} bytes per chunk ({} layout)",
            summary.element, summary.max_chunk_bytes, summary.layout
        )?;

        for chunk in &summary.chunks {
            writeln!(
                self.writer,
                "  {}  {} elements, {} bytes",
                chunk.path.display(),
                chunk.elements,
                chunk.bytes
            )?;
        }
        for path in &summary.transformed {
            writeln!(self.writer, "  transformed: {}", path.display())?;
        }
        for path in &summary.exported {
            writeln!(self.writer, "  exported: {}", path.display())?;
        }

        writeln!(
            self.writer,
            "Created {} chunk files from {} elements in {} ms",
            summary.chunks.len(),
            summary.elements,
            summary.elapsed_ms
        )?;
        self.writer.flush()?;
        Ok(())
    }
}
