use crate::cmd::{inspect::InspectArgs, transform::TransformArgs};
use clap::{Parser, Subcommand};

/// CDT: instrument compiled coroutine code for debugging.
#[derive(Parser, Debug)]
#[command(name = "cdt", version, next_display_order = None)]
pub struct CDTArgs {
    #[command(subcommand)]
    pub cmd: CDTSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CDTSubcommand {
    /// Instrument every compiled unit below a directory.
    #[command(visible_alias = "t")]
    Transform(TransformArgs),

    /// Show how the methods of one compiled unit would be instrumented.
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        CDTArgs::command().debug_assert();
    }

    #[test]
    fn parse_transform() {
        let args = CDTArgs::parse_from([
            "cdt",
            "transform",
            "build/classes",
            "-o",
            "out",
            "--report",
            "report.json",
        ]);
        let CDTSubcommand::Transform(cmd) = args.cmd else { panic!("expected transform") };
        assert_eq!(cmd.input, PathBuf::from("build/classes"));
        assert_eq!(cmd.output, Some(PathBuf::from("out")));
        assert_eq!(cmd.report, Some(PathBuf::from("report.json")));
    }
}
