//! Clock-face formatting for countdown and stopwatch values.

const SECS_PER_HOUR: u64 = 3600;

/// Format a second count as `HH:MM:SS` or `MM:SS`.
///
/// `force_hours` is tri-state: `None` picks the hour field automatically
/// (shown once `total_secs >= 3600`), `Some(true)` always shows it and
/// `Some(false)` never does. When hours are hidden the minute field carries
/// the full minute count, so an hour renders as `60:00`.
///
/// Every field is zero-padded to at least two digits; the leading field is
/// never truncated.
///
/// ```
/// use bigtimer_core::format_duration;
///
/// assert_eq!(format_duration(3661, None), "01:01:01");
/// assert_eq!(format_duration(59, None), "00:59");
/// assert_eq!(format_duration(3600, Some(false)), "60:00");
/// ```
pub fn format_duration(total_secs: u64, force_hours: Option<bool>) -> String {
    let show_hours = force_hours.unwrap_or(total_secs >= SECS_PER_HOUR);
    let seconds = total_secs % 60;

    if show_hours {
        let hours = total_secs / SECS_PER_HOUR;
        let minutes = (total_secs % SECS_PER_HOUR) / 60;
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        let minutes = total_secs / 60;
        format!("{minutes:02}:{seconds:02}")
    }
}
