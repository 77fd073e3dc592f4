//! Size-bounded splitting of one XML document into chunk files
//!
//! The splitter pulls occurrences of the repeating element from an
//! [`ElementStream`], asks a [`SizeMonitor`] whether the next one still fits
//! the current chunk, and rotates to a new [`ChunkSink`] when it does not.
//! Rotation is decided before an element is written, so an element is never
//! split and an element larger than the budget ends up alone in its chunk.
//!
//! Chunks are written to staging files and renamed into place only when the
//! whole document has been processed. A failed run leaves none of its chunks
//! behind.

use crate::config::{defaults, ChunkLayout, SplitConfig};
use crate::error::{Result, SplitError};
use crate::monitor::SizeMonitor;
use crate::observer::{NoopObserver, SplitObserver};
use crate::sink::{ChunkSink, Envelope, StagedChunk};
use crate::stream::{ElementStream, SourceRoot};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Read buffer for the input document
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Splits the configured document into chunk files
#[derive(Debug, Clone)]
pub struct Splitter {
    config: SplitConfig,
}

/// Mutable state of one run
struct Run {
    monitor: SizeMonitor,
    sink: Option<ChunkSink>,
    staged: Vec<StagedChunk>,
    envelope: Option<Envelope>,
}

impl Run {
    fn new(max_bytes: u64) -> Self {
        Self {
            monitor: SizeMonitor::new(max_bytes),
            sink: None,
            staged: Vec::new(),
            envelope: None,
        }
    }

    /// Remove every file this run created
    fn rollback(self) {
        if let Some(sink) = self.sink {
            sink.abandon();
        }
        for staged in &self.staged {
            staged.discard();
        }
    }
}

impl Splitter {
    /// Create a splitter for a validated configuration
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Configuration this splitter runs with
    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Split the input document, returning chunk paths in creation order
    pub fn split(&self) -> Result<Vec<PathBuf>> {
        self.split_with(&mut NoopObserver)
    }

    /// Split the input document, reporting progress to `observer`
    pub fn split_with<O: SplitObserver + ?Sized>(&self, observer: &mut O) -> Result<Vec<PathBuf>> {
        observer.input_selected(self.config.input_selection());

        let path = self.config.input_file();
        let file = File::open(path).map_err(|e| SplitError::io(path, e))?;
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        self.split_reader(reader, &path.display().to_string(), observer)
    }

    /// Split a document read from `reader`.
    ///
    /// `source_name` labels parse errors. The configured input file is not
    /// touched.
    pub fn split_reader<R, O>(
        &self,
        reader: R,
        source_name: &str,
        observer: &mut O,
    ) -> Result<Vec<PathBuf>>
    where
        R: BufRead,
        O: SplitObserver + ?Sized,
    {
        let output_dir = self.config.output_dir();
        fs::create_dir_all(output_dir).map_err(|e| SplitError::io(output_dir, e))?;

        let mut stream = ElementStream::new(reader, self.config.element(), source_name);
        let mut run = Run::new(self.config.max_chunk_bytes());

        if let Err(e) = self.drive(&mut stream, &mut run, observer) {
            run.rollback();
            return Err(e);
        }

        let paths = commit(run.staged)?;
        observer.finished(&paths, stream.elements_emitted());
        Ok(paths)
    }

    fn drive<R, O>(
        &self,
        stream: &mut ElementStream<R>,
        run: &mut Run,
        observer: &mut O,
    ) -> Result<()>
    where
        R: BufRead,
        O: SplitObserver + ?Sized,
    {
        let max_bytes = self.config.max_chunk_bytes();

        while let Some(element) = stream.next_element()? {
            let bytes = element.as_bytes();

            let sink = match run.sink.take() {
                Some(sink) if !run.monitor.would_exceed(bytes) => run.sink.insert(sink),
                current => {
                    if let Some(full) = current {
                        let staged = full.finish()?;
                        observer.chunk_closed(staged.summary());
                        run.staged.push(staged);
                    }

                    if self.config.layout() == ChunkLayout::Document && run.envelope.is_none() {
                        run.envelope =
                            Some(self.envelope(stream.root(), stream.declared_encoding()));
                    }

                    let index = run.staged.len() + 1;
                    let next =
                        ChunkSink::create(self.config.output_dir(), index, run.envelope.as_ref())?;
                    observer.chunk_opened(index, next.path());
                    run.monitor.reset();
                    run.sink.insert(next)
                }
            };

            if bytes.len() as u64 > max_bytes {
                observer.oversized_element(element.ordinal(), bytes.len(), max_bytes);
            }

            sink.write_element(bytes)?;
            run.monitor.add(bytes);
            observer.element_written(element.ordinal(), bytes.len());
        }

        if let Some(last) = run.sink.take() {
            let staged = last.finish()?;
            observer.chunk_closed(staged.summary());
            run.staged.push(staged);
        }
        Ok(())
    }

    /// Envelope for [`ChunkLayout::Document`] chunks
    fn envelope(&self, root: Option<&SourceRoot>, encoding: Option<&[u8]>) -> Envelope {
        let namespaces = root.map(SourceRoot::namespaces).unwrap_or_default();
        let name = match (self.config.envelope_root(), root) {
            (Some(name), _) => name.as_bytes(),
            (None, Some(root)) => root.name(),
            (None, None) => defaults::FALLBACK_ENVELOPE_ROOT.as_bytes(),
        };
        Envelope::new(name, namespaces, encoding)
    }
}

/// Rename staged chunks into place, in index order.
///
/// All or nothing: when one rename fails, chunks already renamed are deleted
/// and the remaining staging files discarded.
fn commit(staged: Vec<StagedChunk>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(staged.len());
    for (i, chunk) in staged.iter().enumerate() {
        match chunk.commit() {
            Ok(path) => paths.push(path),
            Err(e) => {
                for path in &paths {
                    let _ = fs::remove_file(path);
                }
                for rest in &staged[i..] {
                    rest.discard();
                }
                return Err(e);
            }
        }
    }
    Ok(paths)
}
