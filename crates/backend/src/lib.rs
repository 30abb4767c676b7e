//! # cdt-backend
//!
//! CDT's engine instrumenting compiled coroutine code so that a debugger can follow suspensions
//! and resumptions.

#[macro_use]
extern crate tracing;

pub mod analysis;
pub mod artifact;
mod batch;
pub mod config;
pub mod error;
pub mod registry;
pub mod report;
pub mod transformer;
pub mod utils;

pub use batch::{BatchFileTransformer, BatchFileTransformerBuilder};
pub use config::TransformConfig;
pub use error::TransformError;
pub use report::{RunState, TransformReport};
