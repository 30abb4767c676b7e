use std::{error::Error, fmt};

use cdt_backend::TransformError;
use eyre::EyreHandler;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use yansi::Paint;

/// Environment variable switching to the verbose, backtrace-carrying error reports.
const DEBUG_ENV: &str = "CDT_DEBUG";

/// Reports errors the way `cdt` users act on them: a failed run names the first failure and
/// points at `--report` for the rest, anything else is printed with its causes.
#[derive(Debug)]
struct Handler;

impl EyreHandler for Handler {
    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return fmt::Debug::fmt(error, f);
        }

        let aggregate = error.downcast_ref::<TransformError>();
        if let Some(TransformError::Aggregate { count, first }) = aggregate {
            writeln!(f)?;
            write!(f, "{} {count} failure(s) recorded", "transform failed:".red().bold())?;
            write!(f, "\n  first: {first}")?;
            if let Some(cause) = first.source() {
                write!(f, "\n  cause: {cause}")?;
            }
            return write!(
                f,
                "\n\n{}",
                "Rerun with `--report <FILE>` to list every recorded failure.".dim()
            );
        }

        write!(f, "\n{}", error.red())?;
        for cause in std::iter::successors(error.source(), |&e| e.source()) {
            write!(f, "\n  caused by: {cause}")?;
        }
        Ok(())
    }
}

/// Installs the error report and panic hooks.
///
/// With `CDT_DEBUG` set, `color-eyre` reports with full backtraces are used. Otherwise errors go
/// through [`Handler`] and panics ask for the offending unit to be attached to the bug report.
pub fn install_error_handler() {
    if std::env::var_os(DEBUG_ENV).is_some() {
        if std::env::var_os("RUST_BACKTRACE").is_none() {
            std::env::set_var("RUST_BACKTRACE", "full");
        }
        if let Err(e) = color_eyre::install() {
            warn!("failed to install color eyre error hook: {e}");
        }
        return;
    }

    let (panic_hook, _) = color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .panic_section(format!(
            "This is a bug in cdt. Please attach the compiled unit being transformed when it \
             happened, and rerun with {DEBUG_ENV}=1 for a backtrace."
        ))
        .into_hooks();
    panic_hook.install();
    if let Err(e) = eyre::set_hook(Box::new(|_| Box::new(Handler))) {
        warn!("failed to install eyre error hook: {e}");
    }
}

/// Logs to stderr, at `info` unless `RUST_LOG` says otherwise. stdout is left to command output.
pub fn subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init()
}

/// Colors are only used on a live terminal that supports them.
pub fn enable_paint() {
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);
}
