use indicatif::{ProgressBar, ProgressState, ProgressStyle};

fn eta_key(state: &ProgressState, f: &mut dyn std::fmt::Write) {
    let _ = write!(f, "{:.1}s", state.eta().as_secs_f64());
}

/// Builds a progress bar over `len` items, labelled with `label`.
///
/// The bar is hidden when stderr is not a terminal, so it is safe to use from tests.
pub fn progress_bar(len: usize, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = format!(
        "{{spinner:.green}} [{{elapsed_precise}}] [{{wide_bar:.cyan/blue}}] {{pos}}/{{len}} \
         {label} ({{eta}})"
    );
    match ProgressStyle::with_template(&template) {
        Ok(style) => pb.set_style(style.with_key("eta", eta_key).progress_chars("#>-")),
        Err(e) => warn!("invalid progress template: {e}"),
    }
    pb.set_position(0);
    pb
}

#[macro_export]
macro_rules! init_progress {
    ($local:expr, $label:expr) => {{
        $crate::progress_bar::progress_bar($local.len(), $label)
    }};
}

#[macro_export]
macro_rules! update_progress {
    ($pb:expr) => {
        $pb.inc(1);
    };
}
