//! JSON summary formatter

use super::{OutputFormatter, RunSummary};
use anyhow::Result;
use std::io::Write;

/// JSON formatter - the whole summary as one pretty-printed object
pub struct JsonFormatter<W: Write> {
    writer: W,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the formatter, returning the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputFormatter for JsonFormatter<W> {
    fn write_summary(&mut self, summary: &RunSummary) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, summary)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_summary;

    #[test]
    fn test_json_summary() {
        let mut formatter = JsonFormatter::new(Vec::new());
        formatter.write_summary(&sample_summary()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&formatter.into_inner()).unwrap();
        assert_eq!(value["element"], "Worker");
        assert_eq!(value["elements"], 4);
        assert_eq!(value["chunks"][1]["path"], "out/chunk_2.xml");
        assert_eq!(value["chunks"][0]["bytes"], 900);
        assert!(value.get("transformed").is_none());
    }
}
