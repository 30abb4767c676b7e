use std::path::PathBuf;

use cdt_backend::BatchFileTransformer;
use clap::Parser;
use eyre::Result;
use yansi::Paint;

use crate::opts::ConfigOpts;

/// CLI arguments for `cdt transform`.
#[derive(Clone, Debug, Parser)]
pub struct TransformArgs {
    /// The directory tree of compiled units to instrument.
    pub input: PathBuf,

    /// Where to write the instrumented tree. Defaults to overwriting the input in place.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Write the recorded call sites, resume handlers and failures to this JSON file.
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigOpts,
}

impl TransformArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;

        let mut builder = BatchFileTransformer::builder().input_dir(&self.input).config(config);
        if let Some(output) = &self.output {
            builder = builder.output_dir(output);
        }
        let report = builder.build()?.execute()?;

        if let Some(path) = &self.report {
            report.write_json(path)?;
            info!("report written to {path:?}");
        }

        println!(
            "{} {} unit(s) transformed, {} file(s) copied, {} call site(s), {} resume handler(s)",
            if report.is_success() { "Done:".green() } else { "Done with failures:".yellow() },
            report.transformed_units,
            report.copied_files,
            report.registries().call_sites.len(),
            report.registries().resume_handlers.len(),
        );
        for failure in report.failures() {
            eprintln!("{} {}: {}", "error:".red(), failure.path.display(), failure.error);
        }

        report.ensure_success()?;
        Ok(())
    }
}
