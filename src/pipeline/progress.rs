use indicatif::{ProgressBar, ProgressStyle};

/// A bar for one zoom level in the shape
/// `z10 ⠋ [42%] Rendered 420 of 1000. ETA: ~12s`.
pub(crate) fn zoom_bar(zoom: u8, total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template("{prefix:>4} {spinner} [{percent}%] Rendered {pos} of {len}. ETA: ~{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_prefix(format!("z{zoom}"));
    bar
}
