use std::path::PathBuf;

use cdt_backend::{
    analysis::summarize_unit,
    artifact::UnitCodec,
    utils::listing::unit_listing,
};
use clap::Parser;
use eyre::{eyre, Result};
use yansi::Paint;

use crate::opts::ConfigOpts;

/// CLI arguments for `cdt inspect`.
#[derive(Clone, Debug, Parser)]
pub struct InspectArgs {
    /// The compiled unit to inspect.
    pub unit: PathBuf,

    /// Also print the full instruction listing of the unit.
    #[arg(long, short)]
    pub listing: bool,

    #[command(flatten)]
    pub config: ConfigOpts,
}

impl InspectArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        let codec = config.codec();
        if !codec.accepts(&self.unit) {
            return Err(eyre!(
                "{:?} does not look like a compiled unit (expected suffix `{}`)",
                self.unit,
                codec.suffix()
            ));
        }

        let bytes = std::fs::read(&self.unit)?;
        let unit = codec.decode(&self.unit, &bytes)?;

        println!("{}", unit.name().bold());
        for summary in summarize_unit(&config.conventions, &unit) {
            println!("  {summary}");
        }

        if self.listing {
            println!();
            print!("{}", unit_listing(&unit));
        }
        Ok(())
    }
}
