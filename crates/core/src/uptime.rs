//! Station uptime arithmetic.
//!
//! Uptime is computed from the station connection log: an ordered list of
//! online/offline transitions. Dashboards show a per-station percentage
//! over a trailing window plus a fleet-wide average.

use crate::types::Timestamp;

/// One row of the connection log, ordered by `at`.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub at: Timestamp,
    pub online: bool,
}

/// Percentage of `[window_start, window_end]` a station spent online.
///
/// `initially_online` is the station's state at `window_start` (the status
/// of the last transition before the window, or offline if none exists).
/// Transitions outside the window are ignored; repeated same-state
/// transitions are tolerated. Returns a value in `0.0..=100.0`.
pub fn uptime_percent(
    window_start: Timestamp,
    window_end: Timestamp,
    initially_online: bool,
    transitions: &[Transition],
) -> f64 {
    let total_secs = (window_end - window_start).num_seconds();
    if total_secs <= 0 {
        return 0.0;
    }

    let mut online = initially_online;
    let mut cursor = window_start;
    let mut online_secs: i64 = 0;

    for t in transitions {
        if t.at < window_start {
            online = t.online;
            continue;
        }
        if t.at > window_end {
            break;
        }
        if online {
            online_secs += (t.at - cursor).num_seconds();
        }
        cursor = t.at;
        online = t.online;
    }

    if online {
        online_secs += (window_end - cursor).num_seconds();
    }

    (online_secs as f64 / total_secs as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 8, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn always_online_is_100_percent() {
        let pct = uptime_percent(at(0), at(10), true, &[]);
        assert!((pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn always_offline_is_0_percent() {
        let pct = uptime_percent(at(0), at(10), false, &[]);
        assert_eq!(pct, 0.0);
    }

    #[test]
    fn half_window_offline() {
        // Online at start, drops at hour 5, never recovers.
        let transitions = [Transition { at: at(5), online: false }];
        let pct = uptime_percent(at(0), at(10), true, &transitions);
        assert!((pct - 50.0).abs() < 0.01, "got {pct}");
    }

    #[test]
    fn recovery_within_window_counts() {
        // Offline at start, up at hour 2, down at hour 4, up again at hour 9.
        let transitions = [
            Transition { at: at(2), online: true },
            Transition { at: at(4), online: false },
            Transition { at: at(9), online: true },
        ];
        let pct = uptime_percent(at(0), at(10), false, &transitions);
        // Online hours: 2-4 and 9-10 = 3 of 10.
        assert!((pct - 30.0).abs() < 0.01, "got {pct}");
    }

    #[test]
    fn transitions_before_window_set_initial_state() {
        let transitions = [
            Transition { at: at(0) - Duration::hours(3), online: true },
        ];
        let pct = uptime_percent(at(0), at(10), false, &transitions);
        assert!((pct - 100.0).abs() < 0.01, "pre-window transition should override initial state");
    }

    #[test]
    fn empty_window_is_zero() {
        assert_eq!(uptime_percent(at(5), at(5), true, &[]), 0.0);
    }
}
