//! Downstream stages plugged into the split pipeline

pub mod audit;
pub mod xslt;

pub use audit::{CsvAudit, RecordLevel};
pub use xslt::XsltCommand;
