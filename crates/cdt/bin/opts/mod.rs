mod config;

pub use config::ConfigOpts;
