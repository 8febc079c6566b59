//! Human-readable time formatting for track lengths and positions

use std::time::Duration;

/// Format a duration as `mm:ss`, or `h:mm:ss` once it reaches an hour
///
/// Sub-second remainders are truncated, never rounded up.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
