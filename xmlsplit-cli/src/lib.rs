//! xmlsplit CLI library
//!
//! This library provides the command-line interface for splitting large XML
//! exports: settings files, logging setup, progress reporting, summaries and
//! the XSLT and CSV stages of `xmlsplit run`.

pub mod collaborators;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;

pub use commands::Cli;
pub use error::{CliError, CliResult};
