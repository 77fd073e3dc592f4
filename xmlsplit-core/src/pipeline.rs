//! Split, then hand every chunk to downstream collaborators
//!
//! The pipeline only sequences the stages. What a transform or export does
//! is up to the [`Transform`] and [`Export`] implementations the caller
//! plugs in.

use crate::error::Result;
use crate::observer::SplitObserver;
use crate::splitter::Splitter;
use std::path::{Path, PathBuf};

/// Stage name reported for [`Transform`] calls
pub const TRANSFORM_STAGE: &str = "transform";

/// Stage name reported for [`Export`] calls
pub const EXPORT_STAGE: &str = "export";

/// Rewrites one chunk into a new file
pub trait Transform {
    /// Transform `chunk`, returning the path of the produced file
    fn transform(&self, chunk: &Path) -> Result<PathBuf>;
}

/// Turns one document into a flat export file
pub trait Export {
    /// Export `document`, returning the path of the produced file
    fn export(&self, document: &Path) -> Result<PathBuf>;
}

/// Files produced by a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Chunk files, in creation order
    pub chunks: Vec<PathBuf>,
    /// Transform outputs, one per chunk when a transform is configured
    pub transformed: Vec<PathBuf>,
    /// Export outputs
    pub exported: Vec<PathBuf>,
}

/// Split followed by optional transform and export stages
pub struct Pipeline<'a> {
    splitter: Splitter,
    transform: Option<&'a dyn Transform>,
    export: Option<&'a dyn Export>,
}

impl<'a> Pipeline<'a> {
    /// Pipeline that only splits
    pub fn new(splitter: Splitter) -> Self {
        Self {
            splitter,
            transform: None,
            export: None,
        }
    }

    /// Transform every chunk with `transform`
    pub fn with_transform(mut self, transform: &'a dyn Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Export every transformed chunk (or every chunk, without a transform)
    pub fn with_export(mut self, export: &'a dyn Export) -> Self {
        self.export = Some(export);
        self
    }

    /// Splitter of the first stage
    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }

    /// Run all stages in order. The first failing stage stops the run.
    pub fn run<O: SplitObserver + ?Sized>(&self, observer: &mut O) -> Result<PipelineReport> {
        let chunks = self.splitter.split_with(observer)?;

        let transformed = match self.transform {
            Some(transform) => run_stage(TRANSFORM_STAGE, &chunks, observer, |chunk| {
                transform.transform(chunk)
            })?,
            None => Vec::new(),
        };

        let exported = match self.export {
            Some(export) => {
                let documents = if self.transform.is_some() {
                    &transformed
                } else {
                    &chunks
                };
                run_stage(EXPORT_STAGE, documents, observer, |document| {
                    export.export(document)
                })?
            }
            None => Vec::new(),
        };

        Ok(PipelineReport {
            chunks,
            transformed,
            exported,
        })
    }
}

/// Apply one stage to every input in order, stopping at the first failure
fn run_stage<O, F>(
    stage: &str,
    inputs: &[PathBuf],
    observer: &mut O,
    apply: F,
) -> Result<Vec<PathBuf>>
where
    O: SplitObserver + ?Sized,
    F: Fn(&Path) -> Result<PathBuf>,
{
    let mut outputs = Vec::with_capacity(inputs.len());
    for input in inputs {
        observer.stage_started(stage, input);
        let output = apply(input)?;
        observer.stage_completed(stage, input, &output);
        outputs.push(output);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkLayout, SplitConfig};
    use crate::error::SplitError;
    use crate::observer::NoopObserver;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    struct Suffix {
        suffix: &'static str,
        seen: RefCell<Vec<PathBuf>>,
    }

    impl Suffix {
        fn new(suffix: &'static str) -> Self {
            Self {
                suffix,
                seen: RefCell::new(Vec::new()),
            }
        }

        fn apply(&self, path: &Path) -> Result<PathBuf> {
            self.seen.borrow_mut().push(path.to_path_buf());
            let mut name = path.as_os_str().to_os_string();
            name.push(self.suffix);
            let out = PathBuf::from(name);
            fs::copy(path, &out).map_err(|e| SplitError::io(&out, e))?;
            Ok(out)
        }
    }

    impl Transform for Suffix {
        fn transform(&self, chunk: &Path) -> Result<PathBuf> {
            self.apply(chunk)
        }
    }

    impl Export for Suffix {
        fn export(&self, document: &Path) -> Result<PathBuf> {
            self.apply(document)
        }
    }

    struct Failing;

    impl Transform for Failing {
        fn transform(&self, chunk: &Path) -> Result<PathBuf> {
            Err(SplitError::Collaborator {
                stage: "transform",
                path: chunk.to_path_buf(),
                message: "exit status 1".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct Stages {
        started: Vec<String>,
        completed: Vec<(String, PathBuf)>,
    }

    impl SplitObserver for Stages {
        fn stage_started(&mut self, stage: &str, _input: &Path) {
            self.started.push(stage.to_string());
        }

        fn stage_completed(&mut self, stage: &str, _input: &Path, output: &Path) {
            self.completed.push((stage.to_string(), output.to_path_buf()));
        }
    }

    fn splitter(dir: &TempDir) -> Splitter {
        let input = dir.path().join("source.xml");
        fs::write(&input, "<r><w>1</w><w>2</w><w>3</w></r>").unwrap();
        let config = SplitConfig::builder()
            .element("w")
            .max_chunk_bytes(16)
            .input_file(&input)
            .output_dir(dir.path().join("out"))
            .layout(ChunkLayout::Fragment)
            .build()
            .unwrap();
        Splitter::new(config)
    }

    #[test]
    fn test_split_only() {
        let dir = TempDir::new().unwrap();
        let report = Pipeline::new(splitter(&dir)).run(&mut NoopObserver).unwrap();

        assert_eq!(report.chunks.len(), 2);
        assert!(report.transformed.is_empty());
        assert!(report.exported.is_empty());
    }

    #[test]
    fn test_export_follows_transform() {
        let dir = TempDir::new().unwrap();
        let transform = Suffix::new(".t");
        let export = Suffix::new(".csv");

        let report = Pipeline::new(splitter(&dir))
            .with_transform(&transform)
            .with_export(&export)
            .run(&mut NoopObserver)
            .unwrap();

        assert_eq!(*transform.seen.borrow(), report.chunks);
        assert_eq!(*export.seen.borrow(), report.transformed);
        assert_eq!(report.exported.len(), 2);
        assert!(report.exported[0].to_string_lossy().ends_with("chunk_1.xml.t.csv"));
    }

    #[test]
    fn test_export_without_transform_reads_chunks() {
        let dir = TempDir::new().unwrap();
        let export = Suffix::new(".csv");

        let report = Pipeline::new(splitter(&dir))
            .with_export(&export)
            .run(&mut NoopObserver)
            .unwrap();

        assert_eq!(*export.seen.borrow(), report.chunks);
    }

    #[test]
    fn test_failing_transform_stops_run() {
        let dir = TempDir::new().unwrap();
        let export = Suffix::new(".csv");

        let err = Pipeline::new(splitter(&dir))
            .with_transform(&Failing)
            .with_export(&export)
            .run(&mut NoopObserver)
            .unwrap_err();

        assert!(matches!(err, SplitError::Collaborator { stage: "transform", .. }));
        assert!(export.seen.borrow().is_empty());
    }

    #[test]
    fn test_stages_reported_to_observer() {
        let dir = TempDir::new().unwrap();
        let transform = Suffix::new(".t");
        let export = Suffix::new(".csv");
        let mut stages = Stages::default();

        let report = Pipeline::new(splitter(&dir))
            .with_transform(&transform)
            .with_export(&export)
            .run(&mut stages)
            .unwrap();

        assert_eq!(
            stages.started,
            vec!["transform", "transform", "export", "export"]
        );
        let outputs: Vec<PathBuf> = stages.completed.iter().map(|(_, p)| p.clone()).collect();
        let expected: Vec<PathBuf> = report
            .transformed
            .iter()
            .chain(&report.exported)
            .cloned()
            .collect();
        assert_eq!(outputs, expected);
    }

    #[test]
    fn test_failed_stage_not_reported_complete() {
        let dir = TempDir::new().unwrap();
        let mut stages = Stages::default();

        Pipeline::new(splitter(&dir))
            .with_transform(&Failing)
            .run(&mut stages)
            .unwrap_err();

        assert_eq!(stages.started, vec!["transform"]);
        assert!(stages.completed.is_empty());
    }
}
