#[macro_use]
extern crate tracing;

pub mod fs;
pub mod progress_bar;
