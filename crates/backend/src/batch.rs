use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use cdt_utils::{
    fs::{mirror_path, walk_files, write_creating_dirs},
    init_progress, update_progress,
};
use eyre::{eyre, Result};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    analysis::Conventions,
    artifact::UnitCodec,
    config::TransformConfig,
    error::{RecordedFailure, TransformError},
    registry::Registries,
    report::{RunState, TransformReport},
    transformer::UnitTransformer,
};

#[derive(Debug, Default)]
pub struct BatchFileTransformerBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    config: Option<TransformConfig>,
    codec: Option<Arc<dyn UnitCodec>>,
}

impl BatchFileTransformerBuilder {
    /// Set the root of the tree to transform.
    pub fn input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(path.into());
        self
    }

    /// Set the root of the output tree.
    /// If not set, the input tree is overwritten in place.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the configuration.
    /// If not set, the default configuration will be used.
    pub fn config(mut self, config: TransformConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the codec reading and writing compiled units.
    /// If not set, a JSON codec with the configured unit suffix will be used.
    pub fn codec(mut self, codec: Arc<dyn UnitCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Build the batch transformer.
    pub fn build(self) -> Result<BatchFileTransformer> {
        debug!("building batch transformer with {:?}", self);

        let input_dir = self.input_dir.ok_or_else(|| eyre!("missing input directory"))?;
        if !input_dir.is_dir() {
            return Err(eyre!("input {input_dir:?} is not a directory"));
        }
        let output_dir = self.output_dir.unwrap_or_else(|| input_dir.clone());
        let config = self.config.unwrap_or_default();
        let codec = self.codec.unwrap_or_else(|| Arc::new(config.codec()));

        Ok(BatchFileTransformer { input_dir, output_dir, conventions: config.conventions, codec })
    }
}

/// What happened to one file of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FileOutcome {
    Transformed,
    Copied,
}

/// Walks a directory tree and writes its instrumented mirror.
#[derive(Debug)]
pub struct BatchFileTransformer {
    input_dir: PathBuf,
    output_dir: PathBuf,
    conventions: Conventions,
    codec: Arc<dyn UnitCodec>,
}

impl BatchFileTransformer {
    #[inline]
    pub fn builder() -> BatchFileTransformerBuilder {
        BatchFileTransformerBuilder::default()
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run over the whole tree and report on it, whether or not failures were recorded.
    ///
    /// Only I/O failures abort the run; the files written so far stay on disk.
    pub fn execute(&self) -> Result<TransformReport> {
        let mut state = RunState::Idle;
        let registries = Registries::new();
        state = self.advance(state, RunState::Running);

        let files = walk_files(&self.input_dir)
            .map_err(|e| TransformError::io(self.input_dir.clone(), e))?;
        info!(
            "transforming {} file(s) from {:?} into {:?}",
            files.len(),
            self.input_dir,
            self.output_dir
        );

        let pb = init_progress!(files, "files");

        #[cfg(feature = "parallel")]
        let iter = files.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = files.iter();

        let outcomes = iter
            .map(|file| {
                let outcome = self.process_file(file, &registries);
                update_progress!(pb);
                outcome
            })
            .collect::<Result<Vec<_>, TransformError>>();
        pb.finish_and_clear();

        let outcomes = match outcomes {
            Ok(outcomes) => outcomes,
            Err(err) => {
                self.advance(state, RunState::Failed);
                return Err(err.into());
            }
        };

        let transformed = outcomes.iter().filter(|o| **o == FileOutcome::Transformed).count();
        let report = TransformReport::new(
            self.input_dir.clone(),
            self.output_dir.clone(),
            transformed,
            outcomes.len() - transformed,
            registries,
        );
        self.advance(state, report.state());
        info!(
            "{transformed} unit(s) transformed, {} call site(s), {} resume handler(s), {} failure(s)",
            report.registries().call_sites.len(),
            report.registries().resume_handlers.len(),
            report.registries().failures.len()
        );

        Ok(report)
    }

    /// Run over the whole tree, raising the aggregate failure if anything was recorded.
    pub fn transform(&self) -> Result<TransformReport> {
        let report = self.execute()?;
        report.ensure_success()?;
        Ok(report)
    }

    fn advance(&self, from: RunState, to: RunState) -> RunState {
        debug!("run over {:?}: {from} -> {to}", self.input_dir);
        to
    }

    fn process_file(
        &self,
        file: &Path,
        registries: &Registries,
    ) -> Result<FileOutcome, TransformError> {
        let target = mirror_path(file, &self.input_dir, &self.output_dir).ok_or_else(|| {
            TransformError::io(
                file,
                std::io::Error::other(format!("not below {:?}", self.input_dir)),
            )
        })?;
        let bytes = fs::read(file).map_err(|e| TransformError::io(file, e))?;

        let (outcome, output) = if self.codec.accepts(file) {
            let transformer = UnitTransformer::new(&self.conventions, &*self.codec, registries);
            match transformer.transform_bytes(file, &bytes) {
                Ok(output) => (FileOutcome::Transformed, output),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error!("while transforming {file:?}: {err}");
                    registries.failures.append(RecordedFailure::new(file, None, err));
                    (FileOutcome::Copied, bytes)
                }
            }
        } else {
            trace!("copying {file:?}");
            (FileOutcome::Copied, bytes)
        };

        write_creating_dirs(&target, &output).map_err(|e| TransformError::io(target, e))?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{
        AccessFlags, CompiledMethod, CompiledUnit, Instruction, InvokeKind, JsonUnitCodec,
        UnitHeader,
    };

    const CONT: &str = "Lkotlin/coroutines/experimental/Continuation;";

    fn suspend_fn(name: &str, callees: &[&str]) -> CompiledMethod {
        let mut instructions = vec![];
        for (line, callee) in callees.iter().enumerate() {
            instructions.push(Instruction::Line { line: line as u32 + 1 });
            instructions.push(Instruction::Invoke {
                kind: InvokeKind::Static,
                owner: "a/MainKt".to_string(),
                name: callee.to_string(),
                descriptor: format!("({CONT})Ljava/lang/Object;"),
            });
        }
        instructions.push(Instruction::Other { mnemonic: "areturn".to_string(), operands: vec![] });
        CompiledMethod {
            name: name.to_string(),
            descriptor: format!("({CONT})Ljava/lang/Object;"),
            access: AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC),
            instructions,
        }
    }

    fn unit(name: &str, methods: Vec<CompiledMethod>) -> Vec<u8> {
        let unit = CompiledUnit {
            header: UnitHeader {
                name: name.to_string(),
                super_name: Some("java/lang/Object".to_string()),
                source_file: Some("Main.kt".to_string()),
                interfaces: vec![],
            },
            methods,
        };
        serde_json::to_vec(&unit).unwrap()
    }

    fn sample_tree(root: &Path) -> Result<()> {
        write_creating_dirs(
            &root.join("a/MainKt.class.json"),
            &unit("a/MainKt", vec![suspend_fn("foo", &["bar", "baz"]), suspend_fn("bar", &[])]),
        )?;
        write_creating_dirs(
            &root.join("b/c/OtherKt.class.json"),
            &unit("b/c/OtherKt", vec![suspend_fn("qux", &["foo"])]),
        )?;
        write_creating_dirs(&root.join("META-INF/MANIFEST.MF"), b"Manifest-Version: 1.0\n")?;
        write_creating_dirs(&root.join("b/notes.txt"), b"\x00\x01binary")?;
        Ok(())
    }

    #[test]
    fn test_output_mirrors_input() -> Result<()> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        sample_tree(input.path())?;

        let report = BatchFileTransformer::builder()
            .input_dir(input.path())
            .output_dir(output.path())
            .build()?
            .transform()?;

        assert_eq!(report.state(), RunState::Completed);
        assert_eq!(report.transformed_units, 2);
        assert_eq!(report.copied_files, 2);

        let relative = |root: &Path| -> Result<Vec<PathBuf>> {
            Ok(walk_files(root)?
                .into_iter()
                .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
                .collect())
        };
        assert_eq!(relative(input.path())?, relative(output.path())?);

        for copied in ["META-INF/MANIFEST.MF", "b/notes.txt"] {
            assert_eq!(fs::read(input.path().join(copied))?, fs::read(output.path().join(copied))?);
        }
        assert_ne!(
            fs::read(input.path().join("a/MainKt.class.json"))?,
            fs::read(output.path().join("a/MainKt.class.json"))?
        );
        Ok(())
    }

    #[test]
    fn test_call_site_indices_are_gapless() -> Result<()> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        sample_tree(input.path())?;

        let report = BatchFileTransformer::builder()
            .input_dir(input.path())
            .output_dir(output.path())
            .build()?
            .transform()?;

        let names: Vec<_> = report.call_sites().into_iter().map(|c| c.target.name).collect();
        #[cfg(not(feature = "parallel"))]
        assert_eq!(names, ["bar", "baz", "foo"]);
        assert_eq!(names.len(), 3);

        // Every index appears exactly once in the rewritten code.
        let codec = JsonUnitCodec::default();
        let mut indices = vec![];
        for file in walk_files(output.path())? {
            if !codec.accepts(&file) {
                continue;
            }
            let unit = codec.decode(&file, &fs::read(&file)?)?;
            for insns in unit.methods.iter().map(|m| &m.instructions) {
                for pair in insns.windows(2) {
                    if let [Instruction::Push { value }, Instruction::Invoke { name, .. }] = pair {
                        if name == "onAsyncCallReturn" {
                            indices.push(*value);
                        }
                    }
                }
            }
        }
        indices.sort_unstable();
        assert_eq!(indices, [0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_malformed_unit_fails_after_writing_everything() -> Result<()> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        sample_tree(input.path())?;
        write_creating_dirs(&input.path().join("a/Broken.class.json"), b"{\"name\": ")?;

        let transformer = BatchFileTransformer::builder()
            .input_dir(input.path())
            .output_dir(output.path())
            .build()?;

        let err = transformer.transform().unwrap_err();
        let err = err.downcast_ref::<TransformError>().unwrap();
        assert!(matches!(err, TransformError::Aggregate { count: 1, .. }));
        assert!(matches!(err.first_error(), Some(TransformError::MalformedInput { .. })));

        assert_eq!(walk_files(output.path())?.len(), 5);
        assert_eq!(fs::read(output.path().join("a/Broken.class.json"))?, b"{\"name\": ");

        let report = transformer.execute()?;
        assert_eq!(report.state(), RunState::Failed);
        assert!(report.failures()[0].method.is_none());
        Ok(())
    }

    #[test]
    fn test_output_defaults_to_input() -> Result<()> {
        let input = tempfile::tempdir()?;
        sample_tree(input.path())?;
        let before = fs::read(input.path().join("a/MainKt.class.json"))?;

        let transformer = BatchFileTransformer::builder().input_dir(input.path()).build()?;
        assert_eq!(transformer.output_dir(), input.path());
        transformer.transform()?;

        assert_eq!(walk_files(input.path())?.len(), 4);
        assert_ne!(fs::read(input.path().join("a/MainKt.class.json"))?, before);
        Ok(())
    }

    #[test]
    fn test_registries_are_fresh_per_run() -> Result<()> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        sample_tree(input.path())?;

        let transformer = BatchFileTransformer::builder()
            .input_dir(input.path())
            .output_dir(output.path())
            .config(TransformConfig::default())
            .build()?;
        let first = transformer.transform()?;
        let second = transformer.transform()?;
        assert_eq!(first.call_sites(), second.call_sites());
        Ok(())
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let err = BatchFileTransformer::builder().input_dir("/nonexistent/cdt/input").build();
        assert!(err.is_err());
        assert!(BatchFileTransformer::builder().build().is_err());
    }
}
