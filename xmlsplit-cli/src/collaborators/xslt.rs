//! XSLT transform through an external processor

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use xmlsplit_core::pipeline::TRANSFORM_STAGE as STAGE;
use xmlsplit_core::{SplitError, Transform};

/// Runs an XSLT processor (`xsltproc` by default) once per chunk.
///
/// Arguments may contain the placeholders `{input}`, `{output}` and
/// `{stylesheet}`. The output of `chunk_3.xml` is `chunk_3_transformed.xml`
/// in the same directory.
#[derive(Debug, Clone)]
pub struct XsltCommand {
    program: String,
    args: Vec<String>,
    stylesheet: PathBuf,
}

impl XsltCommand {
    /// Create a transform running `program` with `args`
    pub fn new(program: impl Into<String>, args: Vec<String>, stylesheet: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            stylesheet: stylesheet.into(),
        }
    }

    /// Path of the file produced for `input`
    pub fn output_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        input.with_file_name(format!("{stem}_transformed.xml"))
    }

    fn expand(&self, input: &Path, output: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| match arg.as_str() {
                "{input}" => input.as_os_str().to_os_string(),
                "{output}" => output.as_os_str().to_os_string(),
                "{stylesheet}" => self.stylesheet.as_os_str().to_os_string(),
                _ => OsString::from(
                    arg.replace("{input}", &input.to_string_lossy())
                        .replace("{output}", &output.to_string_lossy())
                        .replace("{stylesheet}", &self.stylesheet.to_string_lossy()),
                ),
            })
            .collect()
    }

    fn failure(&self, chunk: &Path, message: String) -> SplitError {
        SplitError::Collaborator {
            stage: STAGE,
            path: chunk.to_path_buf(),
            message,
        }
    }
}

impl Transform for XsltCommand {
    fn transform(&self, chunk: &Path) -> xmlsplit_core::Result<PathBuf> {
        let output_path = Self::output_path(chunk);
        log::debug!("Running {} for {}", self.program, chunk.display());

        let output = Command::new(&self.program)
            .args(self.expand(chunk, &output_path))
            .output()
            .map_err(|e| self.failure(chunk, format!("could not run '{}': {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(
                chunk,
                format!("'{}' exited with {}: {}", self.program, output.status, stderr.trim()),
            ));
        }
        if !output_path.is_file() {
            return Err(self.failure(
                chunk,
                format!("'{}' did not write {}", self.program, output_path.display()),
            ));
        }

        Ok(output_path)
    }
}
