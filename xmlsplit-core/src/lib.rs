//! Streaming, size-bounded splitting of large XML documents
//!
//! A document is read once, front to back. Every occurrence of a configured
//! repeating element is copied verbatim into numbered chunk files
//! (`chunk_1.xml`, `chunk_2.xml`, ...) in document order. A new chunk is
//! started whenever the next element would push the current one over the
//! byte budget, so elements are never split across files.
//!
//! ```no_run
//! use xmlsplit_core::{SplitConfig, Splitter};
//!
//! # fn main() -> xmlsplit_core::Result<()> {
//! let config = SplitConfig::builder()
//!     .element("Worker")
//!     .max_chunk_mb(50)?
//!     .input_dir("input", "*.xml")
//!     .output_dir("output")
//!     .build()?;
//!
//! let chunks = Splitter::new(config).split()?;
//! println!("{} chunks", chunks.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod input;
pub mod monitor;
pub mod observer;
pub mod pipeline;
pub mod sink;
pub mod splitter;
pub mod stream;

pub use config::{ChunkLayout, SplitConfig, SplitConfigBuilder};
pub use error::{Result, SplitError};
pub use input::{resolve_input, InputSelection};
pub use monitor::SizeMonitor;
pub use observer::{ChunkSummary, LogObserver, NoopObserver, SplitObserver};
pub use pipeline::{Export, Pipeline, PipelineReport, Transform};
pub use sink::chunk_file_name;
pub use splitter::Splitter;
pub use stream::{ElementStream, SerializedElement, SourceRoot};
