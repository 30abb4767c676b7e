#[macro_use]
extern crate tracing;

mod args;
mod cmd;
mod opts;
mod utils;

use args::{CDTArgs, CDTSubcommand};
use clap::Parser;
use eyre::Result;

fn main() -> Result<()> {
    utils::install_error_handler();
    utils::subscriber();
    utils::enable_paint();

    let opts = CDTArgs::parse();

    match opts.cmd {
        CDTSubcommand::Transform(cmd) => cmd.run(),
        CDTSubcommand::Inspect(cmd) => cmd.run(),
    }
}
