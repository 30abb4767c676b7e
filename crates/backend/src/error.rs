use std::{fmt::Write, io, path::PathBuf, sync::Arc};

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::artifact::MethodId;

/// A descriptor string that does not follow the JVM descriptor grammar.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid descriptor `{descriptor}`: {reason}")]
pub struct DescriptorError {
    pub descriptor: String,
    pub reason: &'static str,
}

/// Everything that can go wrong while instrumenting a tree of compiled units.
///
/// Classification and structural errors are local to one method, malformed input is local to one
/// unit. Both are recorded and the run moves on. I/O failures abort the run.
#[derive(Clone, Debug, Error)]
pub enum TransformError {
    /// A method had to be an asynchronous entry but is not.
    #[error("{method} is not an asynchronous entry: {reason}")]
    Classification { method: MethodId, reason: String },

    /// An instruction pattern the rewriting relies on is absent.
    #[error("unexpected instruction shape in {method}: {reason}")]
    Structural { method: MethodId, reason: String },

    /// The file could not be decoded into a compiled unit.
    #[error("malformed compiled unit {path:?}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    /// The rewritten unit could not be encoded again.
    #[error("failed to serialize compiled unit {path:?}: {reason}")]
    Serialization { path: PathBuf, reason: String },

    /// Reading or writing a file failed.
    #[error("i/o failure at {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// Raised once at the end of a run that recorded at least one failure.
    #[error("encountered {count} error(s) while transforming")]
    Aggregate {
        count: usize,
        #[source]
        first: Box<TransformError>,
    },
}

impl TransformError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source: Arc::new(source) }
    }

    /// The first recorded failure behind an aggregate error.
    pub fn first_error(&self) -> Option<&Self> {
        match self {
            Self::Aggregate { first, .. } => Some(first),
            _ => None,
        }
    }

    /// Returns true for errors that abort the whole run instead of being recorded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl Serialize for TransformError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A failure recorded during a run, with enough context for post-mortem analysis.
#[derive(Clone, Debug, Serialize)]
pub struct RecordedFailure {
    /// The input file being processed.
    pub path: PathBuf,

    /// The method being instrumented; absent for failures affecting the whole unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<MethodId>,

    pub error: TransformError,

    /// The full error chain.
    pub trace: String,
}

impl RecordedFailure {
    pub fn new(path: impl Into<PathBuf>, method: Option<MethodId>, error: TransformError) -> Self {
        let context = match &method {
            Some(method) => format!("while instrumenting {method}"),
            None => "while transforming unit".to_string(),
        };
        let trace = render_chain(&context, &error);
        Self { path: path.into(), method, error, trace }
    }
}

/// Plain-text rendering of `error` and its sources under `context`, independent of any installed
/// report hook so it can be stored and serialized as is.
fn render_chain(context: &str, error: &(dyn std::error::Error + 'static)) -> String {
    let mut out = format!("{context}\n\nCaused by:");
    let chain = std::iter::successors(Some(error), |e| e.source());
    for (n, cause) in chain.enumerate() {
        let _ = write!(out, "\n  {n}: {cause}");
    }
    out
}
