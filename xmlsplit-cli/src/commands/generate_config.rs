//! Generate config command implementation

use super::GlobalArgs;
use crate::config::DEFAULT_SETTINGS_FILE;
use crate::error::CliError;
use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Output file path
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_SETTINGS_FILE)]
    pub output: PathBuf,

    /// Repeating element name written into the template
    #[arg(short, long, value_name = "NAME", default_value = "Worker")]
    pub element: String,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        global.init_logging("warn");

        if self.output.exists() && !self.force {
            return Err(CliError::OutputExists(self.output.display().to_string()).into());
        }

        fs::write(&self.output, self.generate_template())
            .with_context(|| format!("Failed to write to {}", self.output.display()))?;
        log::info!("Wrote settings template to {}", self.output.display());

        println!("✓ Settings template generated: {}", self.output.display());
        println!();
        println!("Next steps:");
        println!("1. Edit the [split] and [paths] sections");
        println!("2. Validate your settings:");
        println!("   xmlsplit validate --config {}", self.output.display());
        println!("3. Split:");
        println!("   xmlsplit split --config {}", self.output.display());

        Ok(())
    }

    /// Generate template settings content
    fn generate_template(&self) -> String {
        format!(
            r#"# xmlsplit settings

[split]
# Repeating element: a bare name matches any prefix, "wd:Worker" matches exactly
element = "{element}"
# Payload budget per chunk (1 MB = 1024 * 1024 bytes)
max_file_size_mb = 50
# Exact budget in bytes, wins over max_file_size_mb
# max_chunk_bytes = 1048576
# "document": every chunk is a standalone XML file
# "fragment": bare concatenation of the elements
layout = "document"
# Root element of document chunks (default: the source root)
# envelope_root = "Workers"

[paths]
input_dir = "data/input"
# Glob applied inside input_dir; the first match in sorted order is split
input_pattern = "*.xml"
output_dir = "data/output"

[transform]
# Applied to every chunk by `xmlsplit run`
# stylesheet = "config/transform.xslt"
program = "xsltproc"
args = ["-o", "{{output}}", "{{stylesheet}}", "{{input}}"]

[export]
# CSV audit next to every transformed chunk
enabled = true

[logging]
# error, warn, info, debug or trace; RUST_LOG takes precedence
level = "info"
"#,
            element = self.element
        )
    }
}
