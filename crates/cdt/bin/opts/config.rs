use std::path::PathBuf;

use cdt_backend::TransformConfig;
use clap::Parser;
use eyre::Result;
use serde::Serialize;

#[derive(Clone, Debug, Default, Serialize, Parser)]
pub struct ConfigOpts {
    /// A TOML file overriding the default conventions. If not provided, the defaults are used.
    #[clap(long, short, env = "CDT_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConfigOpts {
    pub fn load(&self) -> Result<TransformConfig> {
        match &self.config {
            Some(path) => {
                debug!("loading config from {path:?}");
                TransformConfig::load(path)
            }
            None => Ok(TransformConfig::default()),
        }
    }
}
