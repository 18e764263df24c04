//! Value conversions for socket options.

use std::time::Duration;

use libc::c_int;

/// Whole seconds in `duration`, truncated toward zero.
/// Saturates at `c_int::MAX`.
pub fn int_second(duration: Duration) -> c_int {
    c_int::try_from(duration.as_secs()).unwrap_or(c_int::MAX)
}

/// 1 for true, 0 for false.
pub fn int_bool(value: bool) -> c_int {
    if value {
        1
    } else {
        0
    }
}

/// Counts and queue lengths, saturating at `c_int::MAX`.
pub fn int_count(value: u32) -> c_int {
    c_int::try_from(value).unwrap_or(c_int::MAX)
}

/// Get a human-readable duration for amounts that
/// a human would use.
pub fn human_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms == 0 {
        "off".into()
    } else if ms % 1000 > 0 {
        format!("{}ms", ms)
    } else {
        format!("{}s", ms / 1000)
    }
}
