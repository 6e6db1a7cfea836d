//! Control-change workflow rules.
//!
//! A control state is a named boolean output (pump enable, valve, mode
//! select). Changing one follows a two-phase workflow: a change request is
//! created, and if the control requires confirmation an admin must confirm
//! it before the write is executed. The server is the single source of
//! truth for request expiry; `expires_in_seconds` values sent to clients
//! are display hints only.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Danger level
// ---------------------------------------------------------------------------

/// Safety risk level of toggling a control, 0 (safe) through 3 (critical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DangerLevel(pub i16);

impl DangerLevel {
    pub const SAFE: DangerLevel = DangerLevel(0);
    pub const CAUTION: DangerLevel = DangerLevel(1);
    pub const DANGER: DangerLevel = DangerLevel(2);
    pub const CRITICAL: DangerLevel = DangerLevel(3);

    /// Human-readable label shown alongside confirmation prompts.
    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "Safe - No safety impact",
            1 => "Caution - Minor risk",
            2 => "Danger - Major risk",
            _ => "Critical - Emergency only",
        }
    }

    /// Clamp an arbitrary stored integer into the valid 0-3 range.
    pub fn from_raw(raw: i16) -> Self {
        DangerLevel(raw.clamp(0, 3))
    }
}

// ---------------------------------------------------------------------------
// Request status
// ---------------------------------------------------------------------------

/// Lifecycle status of a control change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
    Failed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Confirmed => "confirmed",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Expired => "expired",
            RequestStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "confirmed" => Some(RequestStatus::Confirmed),
            "cancelled" => Some(RequestStatus::Cancelled),
            "expired" => Some(RequestStatus::Expired),
            "failed" => Some(RequestStatus::Failed),
            _ => None,
        }
    }

    /// Whether the status is terminal. Terminal statuses never transition.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Only `pending` has outgoing edges; everything else is final.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        match self {
            RequestStatus::Pending => next != RequestStatus::Pending,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// History change types
// ---------------------------------------------------------------------------

/// Kind of event recorded in the control state audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Requested,
    Confirmed,
    Executed,
    Failed,
    Synced,
    Timeout,
    Cancelled,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Requested => "requested",
            ChangeType::Confirmed => "confirmed",
            ChangeType::Executed => "executed",
            ChangeType::Failed => "failed",
            ChangeType::Synced => "synced",
            ChangeType::Timeout => "timeout",
            ChangeType::Cancelled => "cancelled",
        }
    }
}

// ---------------------------------------------------------------------------
// Permission levels
// ---------------------------------------------------------------------------

/// What a per-control permission grant allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Read the control state only.
    View,
    /// Request a change; confirmation rules still apply.
    Request,
    /// Request a change that executes immediately, bypassing confirmation.
    Execute,
}

impl PermissionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::View => "view",
            PermissionLevel::Request => "request",
            PermissionLevel::Execute => "execute",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "view" => Some(PermissionLevel::View),
            "request" => Some(PermissionLevel::Request),
            "execute" => Some(PermissionLevel::Execute),
            _ => None,
        }
    }

    /// Whether this level allows requesting a value change at all.
    pub fn allows_change(self) -> bool {
        !matches!(self, PermissionLevel::View)
    }
}

// ---------------------------------------------------------------------------
// Rate limiting and expiry arithmetic
// ---------------------------------------------------------------------------

/// Seconds remaining in a control's rate-limit window, clamped at zero.
///
/// Returns `0.0` once `rate_limit_secs` have elapsed since the last change,
/// so callers can use `> 0.0` as the "still limited" test.
pub fn rate_limit_remaining(last_changed_at: Timestamp, rate_limit_secs: i32, now: Timestamp) -> f64 {
    let elapsed = (now - last_changed_at).num_milliseconds() as f64 / 1000.0;
    (rate_limit_secs as f64 - elapsed).max(0.0)
}

/// Seconds until a pending request expires, clamped at zero.
pub fn seconds_until_expiry(expires_at: Timestamp, now: Timestamp) -> i64 {
    (expires_at - now).num_seconds().max(0)
}

/// Whether a pending request has passed its expiry instant.
pub fn request_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    now > expires_at
}

/// Convenience wrapper over [`rate_limit_remaining`] using the wall clock.
pub fn rate_limit_remaining_now(last_changed_at: Timestamp, rate_limit_secs: i32) -> f64 {
    rate_limit_remaining(last_changed_at, rate_limit_secs, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn rate_limit_counts_down_and_clamps_at_zero() {
        let now = Utc::now();
        let changed = now - Duration::seconds(2);

        let remaining = rate_limit_remaining(changed, 5, now);
        assert!((remaining - 3.0).abs() < 0.01, "expected ~3s, got {remaining}");

        // Window fully elapsed: must clamp, never go negative.
        let changed = now - Duration::seconds(30);
        assert_eq!(rate_limit_remaining(changed, 5, now), 0.0);
    }

    #[test]
    fn expiry_countdown_never_negative() {
        let now = Utc::now();
        let expires = now - Duration::seconds(10);
        assert_eq!(seconds_until_expiry(expires, now), 0);
        assert!(request_expired(expires, now));

        let expires = now + Duration::seconds(30);
        assert_eq!(seconds_until_expiry(expires, now), 30);
        assert!(!request_expired(expires, now));
    }

    #[test]
    fn pending_is_the_only_non_terminal_status() {
        assert!(!RequestStatus::Pending.is_terminal());
        for s in [
            RequestStatus::Confirmed,
            RequestStatus::Cancelled,
            RequestStatus::Expired,
            RequestStatus::Failed,
        ] {
            assert!(s.is_terminal(), "{s:?} must be terminal");
            assert!(!s.can_transition_to(RequestStatus::Pending));
            assert!(!s.can_transition_to(RequestStatus::Confirmed));
        }
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Confirmed));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Expired));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            RequestStatus::Pending,
            RequestStatus::Confirmed,
            RequestStatus::Cancelled,
            RequestStatus::Expired,
            RequestStatus::Failed,
        ] {
            assert_eq!(RequestStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(RequestStatus::parse("nonsense"), None);
    }

    #[test]
    fn danger_level_labels_and_clamping() {
        assert_eq!(DangerLevel::SAFE.label(), "Safe - No safety impact");
        assert_eq!(DangerLevel::from_raw(7), DangerLevel::CRITICAL);
        assert_eq!(DangerLevel::from_raw(-1), DangerLevel::SAFE);
    }

    #[test]
    fn permission_levels() {
        assert!(!PermissionLevel::View.allows_change());
        assert!(PermissionLevel::Request.allows_change());
        assert!(PermissionLevel::Execute.allows_change());
        assert_eq!(PermissionLevel::parse("execute"), Some(PermissionLevel::Execute));
        assert_eq!(PermissionLevel::parse(""), None);
    }
}
