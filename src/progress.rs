//! Progress bars with a log-only fallback.
//!
//! Interactive runs get indicatif bars on stderr. With `--log-only` the bars
//! are hidden and [`log_progress`] emits periodic `info` lines instead, which
//! reads better in container logs.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// "42.0s" under a minute, "3.5m" above.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

const STEPS_TEMPLATE: &str = "{msg} {pos}/{len} [{bar:32}] {elapsed} (ETA {eta})";
const SPINNER_TEMPLATE: &str = "{spinner} {msg} {elapsed}";

/// Apply `style`, or hide the bar entirely in log-only mode.
fn styled(pb: ProgressBar, style: ProgressStyle, msg: &str) -> ProgressBar {
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb
}

/// Bar over `len` tracks or playlists.
pub fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(STEPS_TEMPLATE)
        .unwrap()
        .progress_chars("#>-");
    styled(ProgressBar::new(len), style, msg)
}

/// Log `current/total` every `interval` steps and on the last one.
/// Only active in log-only mode.
pub fn log_progress(phase: &str, current: u64, total: u64, interval: u64) {
    if !is_log_only() || total == 0 {
        return;
    }
    if current % interval.max(1) == 0 || current == total {
        let pct = 100.0 * current as f64 / total as f64;
        log::info!("[{}] {}/{} ({:.1}%)", phase, current, total, pct);
    }
}

/// Spinner for a step of unknown length, such as an index rebuild.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap();
    let pb = styled(ProgressBar::new_spinner(), style, msg);
    if !is_log_only() {
        pb.enable_steady_tick(Duration::from_millis(120));
    }
    pb
}
