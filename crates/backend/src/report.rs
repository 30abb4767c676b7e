use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::Serialize;

use crate::{
    analysis::SuspendCall,
    artifact::MethodId,
    error::{RecordedFailure, TransformError},
    registry::Registries,
};

/// Lifecycle of a batch run. A run never resumes; every run starts from `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// The outcome of a batch run: the three registries plus some bookkeeping.
#[derive(Debug, Serialize)]
pub struct TransformReport {
    state: RunState,

    pub input_dir: PathBuf,
    pub output_dir: PathBuf,

    /// Compiled units decoded, instrumented and written again.
    pub transformed_units: usize,

    /// Files copied verbatim, including units that failed to decode.
    pub copied_files: usize,

    #[serde(flatten)]
    registries: Registries,
}

impl TransformReport {
    pub(crate) fn new(
        input_dir: PathBuf,
        output_dir: PathBuf,
        transformed_units: usize,
        copied_files: usize,
        registries: Registries,
    ) -> Self {
        let state =
            if registries.failures.is_empty() { RunState::Completed } else { RunState::Failed };
        Self { state, input_dir, output_dir, transformed_units, copied_files, registries }
    }

    /// Either [`RunState::Completed`] or [`RunState::Failed`].
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed
    }

    /// Number of files written to the output tree.
    pub fn written_files(&self) -> usize {
        self.transformed_units + self.copied_files
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Recorded call sites, indexed as in the injected `onAsyncCallReturn` hooks.
    pub fn call_sites(&self) -> Vec<SuspendCall> {
        self.registries.call_sites.snapshot()
    }

    /// Known resumption handlers, indexed as in the injected `onResumeEntry` hooks.
    pub fn resume_handlers(&self) -> Vec<MethodId> {
        self.registries.resume_handlers.snapshot()
    }

    pub fn failures(&self) -> Vec<RecordedFailure> {
        self.registries.failures.snapshot()
    }

    /// Raise the aggregate failure if anything was recorded during the run.
    pub fn ensure_success(&self) -> Result<(), TransformError> {
        let count = self.registries.failures.len();
        match self.registries.failures.first() {
            Some(first) => Err(TransformError::Aggregate { count, first: Box::new(first.error) }),
            None => Ok(()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON to `path`.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .wrap_err_with(|| format!("failed to write report to {path:?}"))
    }
}
