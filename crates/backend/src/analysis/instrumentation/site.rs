use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{analysis::scanner::UNKNOWN_LINE, artifact::MethodId};

/// Where in the source an asynchronous call happens, as far as the compiled unit tells.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallPosition {
    /// The source file of the calling unit, if recorded.
    pub file: Option<String>,

    /// The line of the call, or `-1` if unknown.
    pub line: i32,
}

impl CallPosition {
    pub fn new(file: Option<String>, line: i32) -> Self {
        Self { file, line }
    }

    pub fn is_known(&self) -> bool {
        self.line != UNKNOWN_LINE
    }
}

impl fmt::Display for CallPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.as_deref().unwrap_or("<unknown>");
        if self.is_known() {
            write!(f, "{file}:{}", self.line)
        } else {
            write!(f, "{file}")
        }
    }
}

/// A recorded asynchronous call site. The debugger receives its registry index through the
/// `onAsyncCallReturn` hook injected right after the call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuspendCall {
    /// The asynchronous method being called.
    pub target: MethodId,

    /// The method containing the call.
    pub caller: MethodId,

    pub position: CallPosition,
}

impl fmt::Display for SuspendCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} at {}", self.caller, self.target, self.position)
    }
}
