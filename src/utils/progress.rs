//! Progress indicators for the few long-running steps (release downloads).
//!
//! indicatif hides its output when stderr is not a terminal, so these are
//! safe to use unconditionally. `--quiet` passes `hidden = true`.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}

fn download_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸━")
}

/// Spinner with `msg`, ticking on its own.
pub fn spinner(msg: impl Into<String>, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Byte progress bar when the size is known, a spinner otherwise.
pub fn download_bar(msg: impl Into<String>, total: Option<u64>, hidden: bool) -> ProgressBar {
    match total {
        Some(len) if !hidden && len > 0 => {
            let pb = ProgressBar::new(len);
            pb.set_style(download_style());
            pb.set_message(msg.into());
            pb
        }
        _ => spinner(msg, hidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bars() {
        let pb = download_bar("x", Some(10), true);
        assert!(pb.is_hidden());
        pb.inc(5);
        pb.finish_and_clear();

        assert!(spinner("y", true).is_hidden());
    }

    #[test]
    fn test_download_bar_length() {
        let pb = download_bar("tutils.zip", Some(1024), false);
        assert_eq!(pb.length(), Some(1024));
        pb.finish_and_clear();
    }
}
