pub mod classifier;
pub mod conventions;
pub mod instrumentation;
pub mod locator;
pub mod scanner;
pub mod summary;

pub use classifier::{MethodClassifier, MethodRole};
pub use conventions::Conventions;
pub use instrumentation::{CallPosition, InstrumentationInjector, MethodOutcome, SuspendCall};
pub use locator::ContinuationLocator;
pub use scanner::{ScannedCall, SuspendCallScanner, UNKNOWN_LINE};
pub use summary::{summarize_unit, MethodSummary};
