//! Flat CSV audit of a chunk
//!
//! Every record becomes one row: the children of the document root, or the
//! top-level elements of a fragment chunk. Columns are the dotted paths of
//! the leaves below a record (`Worker.Position.Title`), attributes are
//! `path@name`. A path that repeats inside one record has its values joined
//! with `|`. Names are local names; namespace declarations are dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use xmlsplit_core::pipeline::EXPORT_STAGE as STAGE;
use xmlsplit_core::{ChunkLayout, Export, SplitError};

/// Separator between repeated values of one column
pub const REPEAT_SEPARATOR: char = '|';

/// Where the records of an exported document sit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordLevel {
    /// One root element; each of its children is a record
    #[default]
    RootChildren,
    /// No common root; each top-level element is a record
    TopLevel,
}

impl RecordLevel {
    /// Records of a chunk written with `layout`
    pub fn for_layout(layout: ChunkLayout) -> Self {
        match layout {
            ChunkLayout::Document => RecordLevel::RootChildren,
            ChunkLayout::Fragment => RecordLevel::TopLevel,
        }
    }

    fn depth(self) -> usize {
        match self {
            RecordLevel::RootChildren => 2,
            RecordLevel::TopLevel => 1,
        }
    }
}

/// Writes `<stem>.csv` next to each exported document
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvAudit {
    records: RecordLevel,
}

impl CsvAudit {
    /// Audit reading records at `records`
    pub fn new(records: RecordLevel) -> Self {
        Self { records }
    }

    /// Path of the CSV produced for `document`
    pub fn output_path(document: &Path) -> PathBuf {
        document.with_extension("csv")
    }

    /// Collect the rows of `document`
    pub fn read_table(&self, document: &Path) -> xmlsplit_core::Result<Table> {
        let file = File::open(document).map_err(|e| SplitError::io(document, e))?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        let mut collector = Collector::new(self.records);
        let mut buf = Vec::new();

        let failure = |position: u64, message: String| SplitError::Collaborator {
            stage: STAGE,
            path: document.to_path_buf(),
            message: format!("at byte {position}: {message}"),
        };

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| failure(reader.buffer_position(), e.to_string()))?;
            let result = match event {
                Event::Start(e) => collector.start(&e),
                Event::Empty(e) => collector.start(&e).map(|()| collector.end()),
                Event::End(_) => {
                    collector.end();
                    Ok(())
                }
                Event::Text(e) => e
                    .unescape()
                    .map(|text| collector.text(&text))
                    .map_err(|e| e.to_string()),
                Event::CData(e) => {
                    collector.text(&String::from_utf8_lossy(&e));
                    Ok(())
                }
                Event::Eof => break,
                _ => Ok(()),
            };
            result.map_err(|message| failure(reader.buffer_position(), message))?;
            buf.clear();
        }

        if collector.depth != 0 {
            return Err(failure(
                reader.buffer_position(),
                "unexpected end of document".to_string(),
            ));
        }
        Ok(collector.table)
    }
}

impl Export for CsvAudit {
    fn export(&self, document: &Path) -> xmlsplit_core::Result<PathBuf> {
        let table = self.read_table(document)?;

        let path = Self::output_path(document);
        let file = File::create(&path).map_err(|e| SplitError::io(&path, e))?;
        table
            .write_csv(file)
            .map_err(|e| SplitError::io(&path, io::Error::from(e)))?;

        log::debug!(
            "{} rows, {} columns in {}",
            table.rows.len(),
            table.columns.len(),
            path.display()
        );
        Ok(path)
    }
}

/// Rows of an audit, columns in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Column headers
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = *self.index.get(column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    fn column(&mut self, name: &str) -> usize {
        if let Some(&col) = self.index.get(name) {
            return col;
        }
        let col = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), col);
        col
    }

    /// Write header and rows; fields are quoted only where needed
    pub fn write_csv<W: Write>(&self, out: W) -> csv::Result<()> {
        if self.columns.is_empty() {
            return Ok(());
        }
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(
                (0..self.columns.len())
                    .map(|col| row.get(col).and_then(|v| v.as_deref()).unwrap_or("")),
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Streaming state while reading one document
#[derive(Debug)]
struct Collector {
    table: Table,
    record_depth: usize,
    depth: usize,
    top_level: usize,
    path: Vec<String>,
    text: Vec<String>,
    row: Vec<Option<String>>,
}

impl Collector {
    fn new(records: RecordLevel) -> Self {
        Self {
            table: Table::default(),
            record_depth: records.depth(),
            depth: 0,
            top_level: 0,
            path: Vec::new(),
            text: Vec::new(),
            row: Vec::new(),
        }
    }

    fn start(&mut self, e: &BytesStart<'_>) -> Result<(), String> {
        self.depth += 1;
        if self.depth == 1 {
            self.top_level += 1;
            if self.record_depth > 1 && self.top_level > 1 {
                return Err(
                    "more than one top-level element; expected a single document root"
                        .to_string(),
                );
            }
        }
        if self.depth < self.record_depth {
            return Ok(());
        }

        self.path
            .push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
        self.text.push(String::new());

        let prefix = self.path.join(".");
        for attr in e.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = attr.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            let column = format!(
                "{prefix}@{}",
                String::from_utf8_lossy(attr.key.local_name().as_ref())
            );
            self.put(&column, &value);
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(current) = self.text.last_mut() {
            current.push_str(text);
        }
    }

    fn end(&mut self) {
        if self.depth >= self.record_depth {
            let text = self.text.pop().unwrap_or_default();
            let value = text.trim();
            if !value.is_empty() {
                let column = self.path.join(".");
                self.put(&column, value);
            }
            self.path.pop();

            if self.depth == self.record_depth {
                let row = std::mem::take(&mut self.row);
                self.table.rows.push(row);
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn put(&mut self, column: &str, value: &str) {
        let col = self.table.column(column);
        if self.row.len() <= col {
            self.row.resize(col + 1, None);
        }
        match &mut self.row[col] {
            Some(existing) => {
                existing.push(REPEAT_SEPARATOR);
                existing.push_str(value);
            }
            slot => *slot = Some(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn table_at(records: RecordLevel, xml: &str) -> xmlsplit_core::Result<Table> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunk_1.xml");
        fs::write(&path, xml).unwrap();
        CsvAudit::new(records).read_table(&path)
    }

    fn table_for(xml: &str) -> xmlsplit_core::Result<Table> {
        table_at(RecordLevel::RootChildren, xml)
    }

    #[test]
    fn test_rows_per_root_child() {
        let table = table_for(
            r#"<?xml version="1.0"?>
<wd:Report xmlns:wd="urn:x">
  <wd:Worker id="1"><wd:Name>Ada</wd:Name><wd:Position><wd:Title>Analyst</wd:Title></wd:Position></wd:Worker>
  <wd:Worker id="2"><wd:Name>Grace</wd:Name></wd:Worker>
</wd:Report>"#,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.columns(),
            ["Worker@id", "Worker.Name", "Worker.Position.Title"]
        );
        assert_eq!(table.get(0, "Worker.Position.Title"), Some("Analyst"));
        assert_eq!(table.get(1, "Worker.Name"), Some("Grace"));
        assert_eq!(table.get(1, "Worker.Position.Title"), None);
    }

    #[test]
    fn test_repeated_values_joined() {
        let table = table_for("<r><w><p>1</p><p>2</p><p>3</p></w></r>").unwrap();
        assert_eq!(table.get(0, "w.p"), Some("1|2|3"));
    }

    #[test]
    fn test_entities_and_cdata() {
        let table = table_for("<r><w><a>x &amp; y</a><b><![CDATA[<raw>]]></b></w></r>").unwrap();
        assert_eq!(table.get(0, "w.a"), Some("x & y"));
        assert_eq!(table.get(0, "w.b"), Some("<raw>"));
    }

    #[test]
    fn test_unclosed_document_fails() {
        let err = table_for("<r><w><a>1</a>").unwrap_err();
        assert!(matches!(err, SplitError::Collaborator { stage: "export", .. }));
    }

    #[test]
    fn test_csv_quoting() {
        let table = table_for(r#"<r><w><a>plain</a><b>with, comma</b><c>say "hi"</c></w></r>"#)
            .unwrap();
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "w.a,w.b,w.c\nplain,\"with, comma\",\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_export_writes_csv_next_to_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunk_2_transformed.xml");
        fs::write(&path, "<r><w><a>1</a></w><w><a>2</a></w></r>").unwrap();

        let csv = CsvAudit::default().export(&path).unwrap();
        assert_eq!(csv, dir.path().join("chunk_2_transformed.csv"));
        assert_eq!(fs::read_to_string(csv).unwrap(), "w.a\n1\n2\n");
    }

    #[test]
    fn test_fragment_records_are_top_level_elements() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunk_1.xml");
        fs::write(&path, "<w><a>1</a></w><w><a>2</a></w>").unwrap();

        let audit = CsvAudit::new(RecordLevel::for_layout(ChunkLayout::Fragment));
        let csv = audit.export(&path).unwrap();
        assert_eq!(fs::read_to_string(csv).unwrap(), "w.a\n1\n2\n");
    }

    #[test]
    fn test_single_fragment_record_keeps_its_prefix() {
        let table = table_at(RecordLevel::TopLevel, r#"<w id="7"><a>1</a><a>2</a></w>"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns(), ["w@id", "w.a"]);
        assert_eq!(table.get(0, "w.a"), Some("1|2"));
    }

    #[test]
    fn test_rootless_input_rejected_when_root_expected() {
        let err = table_for("<w><a>1</a></w><w><a>2</a></w>").unwrap_err();
        match err {
            SplitError::Collaborator { stage, message, .. } => {
                assert_eq!(stage, "export");
                assert!(message.contains("more than one top-level element"));
            }
            other => panic!("expected collaborator error, got {other:?}"),
        }
    }

    #[test]
    fn test_record_level_follows_layout() {
        assert_eq!(
            RecordLevel::for_layout(ChunkLayout::Document),
            RecordLevel::RootChildren
        );
        assert_eq!(
            RecordLevel::for_layout(ChunkLayout::Fragment),
            RecordLevel::TopLevel
        );
    }
}
