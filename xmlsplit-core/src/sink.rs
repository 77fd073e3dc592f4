//! Chunk files
//!
//! A [`ChunkSink`] writes one chunk to a staging file next to its final
//! location. Closing it yields a [`StagedChunk`], which the splitter renames
//! into place only after the whole run has succeeded.

use crate::error::{Result, SplitError};
use crate::observer::ChunkSummary;
use crate::stream::NamespaceDecl;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Suffix of chunk files that are still being written
pub const STAGING_SUFFIX: &str = ".part";

/// Encoding declared by document chunks when the source declares none
pub const DEFAULT_ENCODING: &[u8] = b"UTF-8";

/// File name of the chunk with the given index
pub fn chunk_file_name(index: usize) -> String {
    format!("chunk_{index}.xml")
}

/// Declaration and synthetic root wrapped around a chunk's payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    open: Vec<u8>,
    close: Vec<u8>,
}

impl Envelope {
    /// Envelope named `root_name`, carrying the given namespace declarations.
    ///
    /// `encoding` must be the source document's encoding, since payloads are
    /// copied byte for byte. `None` declares UTF-8.
    pub fn new(root_name: &[u8], namespaces: &[NamespaceDecl], encoding: Option<&[u8]>) -> Self {
        let encoding = encoding.unwrap_or(DEFAULT_ENCODING);
        let mut open = Vec::with_capacity(root_name.len() + encoding.len() + 48);
        open.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"");
        open.extend_from_slice(encoding);
        open.extend_from_slice(b"\"?>\n<");
        open.extend_from_slice(root_name);
        for decl in namespaces {
            decl.write_attribute(&mut open);
        }
        open.push(b'>');

        let mut close = Vec::with_capacity(root_name.len() + 4);
        close.extend_from_slice(b"</");
        close.extend_from_slice(root_name);
        close.extend_from_slice(b">\n");

        Self { open, close }
    }

    /// Bytes written before the payload
    pub fn opening(&self) -> &[u8] {
        &self.open
    }

    /// Bytes written after the payload
    pub fn closing(&self) -> &[u8] {
        &self.close
    }

    /// Constant per-chunk overhead in bytes
    pub fn overhead(&self) -> usize {
        self.open.len() + self.close.len()
    }
}

/// Chunk file currently receiving elements
#[derive(Debug)]
pub struct ChunkSink {
    index: usize,
    path: PathBuf,
    staging_path: PathBuf,
    writer: BufWriter<File>,
    closing: Option<Vec<u8>>,
    elements: usize,
    payload_bytes: u64,
}

impl ChunkSink {
    /// Open chunk `index` in `dir`, writing the envelope opening if any
    pub fn create(dir: &Path, index: usize, envelope: Option<&Envelope>) -> Result<Self> {
        let path = dir.join(chunk_file_name(index));
        let staging_path = staging_path_for(&path);

        let file = File::create(&staging_path).map_err(|e| SplitError::io(&staging_path, e))?;
        let mut sink = Self {
            index,
            path,
            staging_path,
            writer: BufWriter::new(file),
            closing: envelope.map(|e| e.closing().to_vec()),
            elements: 0,
            payload_bytes: 0,
        };

        if let Some(envelope) = envelope {
            if let Err(e) = sink.write_raw(envelope.opening()) {
                sink.abandon();
                return Err(e);
            }
        }
        Ok(sink)
    }

    /// Append one serialized element
    pub fn write_element(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_raw(bytes)?;
        self.elements += 1;
        self.payload_bytes += bytes.len() as u64;
        Ok(())
    }

    /// Write the envelope closing, flush and close the staging file.
    ///
    /// On failure the staging file is removed.
    pub fn finish(mut self) -> Result<StagedChunk> {
        if let Err(e) = self.close() {
            self.abandon();
            return Err(e);
        }

        Ok(StagedChunk {
            summary: ChunkSummary {
                index: self.index,
                path: self.path,
                elements: self.elements,
                payload_bytes: self.payload_bytes,
            },
            staging_path: self.staging_path,
        })
    }

    /// Close and delete the staging file without committing it
    pub fn abandon(self) {
        let staging_path = self.staging_path;
        drop(self.writer);
        let _ = fs::remove_file(staging_path);
    }

    /// 1-based chunk index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Final path of the chunk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Elements written so far
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Payload bytes written so far
    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }

    fn close(&mut self) -> Result<()> {
        if let Some(closing) = self.closing.take() {
            self.write_raw(&closing)?;
        }
        self.writer
            .flush()
            .map_err(|e| SplitError::io(&self.staging_path, e))
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| SplitError::io(&self.staging_path, e))
    }
}

/// A closed chunk waiting to be renamed into place
#[derive(Debug)]
pub struct StagedChunk {
    summary: ChunkSummary,
    staging_path: PathBuf,
}

impl StagedChunk {
    /// Index, final path and sizes of the chunk
    pub fn summary(&self) -> &ChunkSummary {
        &self.summary
    }

    /// Where the chunk currently lives
    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// Rename the staging file to its final name
    pub fn commit(&self) -> Result<PathBuf> {
        fs::rename(&self.staging_path, &self.summary.path)
            .map_err(|e| SplitError::io(&self.summary.path, e))?;
        Ok(self.summary.path.clone())
    }

    /// Delete the staging file
    pub fn discard(&self) {
        let _ = fs::remove_file(&self.staging_path);
    }
}

fn staging_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}
