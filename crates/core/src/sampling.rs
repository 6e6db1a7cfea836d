//! Whole-number-change sampling.
//!
//! Slow-moving analog tags (reservoir level, totalizer counts) would flood
//! the telemetry log if every read were stored. When a node opts in, a read
//! is only logged when the integer part of the value changes relative to
//! the last logged read.

/// Decide whether a freshly read value should be logged.
///
/// `last_whole` is the integer part recorded at the previous logged read
/// (`None` means nothing has been logged yet, so always log). Non-numeric
/// values are always logged since change detection is meaningless for them.
pub fn should_log(last_whole: Option<i64>, raw_value: &str) -> bool {
    let Ok(value) = raw_value.trim().parse::<f64>() else {
        return true;
    };
    match last_whole {
        None => true,
        Some(prev) => value.trunc() as i64 != prev,
    }
}

/// Integer part of a raw value, for persisting alongside the read.
pub fn whole_part(raw_value: &str) -> Option<i64> {
    raw_value.trim().parse::<f64>().ok().map(|v| v.trunc() as i64)
}
