//! Human-readable rendering of byte counts, speeds, and durations.
//!
//! Pure functions with exact output contracts: status lines and terminal
//! messages are assembled from these strings, and tests assert them
//! verbatim.

/// Formats a transfer speed, given bytes per second, in bit units.
///
/// Negative input (no measurement) renders as `"--"`; sub-bit rates as
/// `"< 1 bps"`. Precision widens with the unit: whole bits below 1 kbps,
/// one decimal below 1 Mbps, two decimals above.
pub fn format_speed(bytes_per_second: f64) -> String {
    if bytes_per_second < 0.0 {
        return "--".to_string();
    }
    let bps = bytes_per_second * 8.0;
    if bps == 0.0 {
        "0 bps".to_string()
    } else if bps < 1.0 {
        "< 1 bps".to_string()
    } else if bps < 1_000.0 {
        format!("{bps:.0} bps")
    } else if bps < 1_000_000.0 {
        format!("{:.1} kbps", bps / 1_000.0)
    } else if bps < 1_000_000_000.0 {
        format!("{:.2} Mbps", bps / 1_000_000.0)
    } else {
        format!("{:.2} Gbps", bps / 1_000_000_000.0)
    }
}

/// Formats a duration in milliseconds as `HH:MM:SS`.
///
/// Negative input clamps to zero. Hours grow without day rollover, so a
/// four-day transfer reads `100:00:00`.
pub fn format_time(millis: i64) -> String {
    let total_secs = millis.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Formats a byte count in binary (1024-based) units.
///
/// Counts under 1 KiB render as an integer with a space (`"512 B"`); larger
/// counts carry one decimal and the unit letter with no space (`"976.6KB"`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1}{}B", UNITS[unit])
}
