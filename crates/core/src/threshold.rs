//! Threshold evaluation for sampled node values.
//!
//! All breach logic lives server-side. A node carries optional warning and
//! critical levels plus operational min/max bounds; every sampled value is
//! evaluated against them and a breach record is created when one trips.

use serde::Serialize;

/// Breach severity. Critical outranks warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BreachLevel {
    Warning,
    Critical,
}

impl BreachLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            BreachLevel::Warning => "Warning",
            BreachLevel::Critical => "Critical",
        }
    }
}

/// Threshold settings attached to a node.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdConfig {
    /// Value at or above which a warning breach is recorded.
    pub warning_level: Option<f64>,
    /// Value at or above which a critical breach is recorded.
    pub critical_level: Option<f64>,
    /// Minimum acceptable value; readings below it are warning breaches.
    pub min_value: Option<f64>,
    /// Maximum acceptable value; readings above it are warning breaches.
    pub max_value: Option<f64>,
    /// Master enable for threshold monitoring on this node.
    pub active: bool,
}

impl ThresholdConfig {
    /// Evaluate a numeric value against the thresholds.
    ///
    /// Critical level is checked first, then warning, then the min/max
    /// bounds. Returns `None` when monitoring is disabled or nothing trips.
    pub fn evaluate(&self, value: f64) -> Option<BreachLevel> {
        if !self.active {
            return None;
        }

        if let Some(critical) = self.critical_level {
            if value >= critical {
                return Some(BreachLevel::Critical);
            }
        }
        if let Some(warning) = self.warning_level {
            if value >= warning {
                return Some(BreachLevel::Warning);
            }
        }
        if let Some(min) = self.min_value {
            if value < min {
                return Some(BreachLevel::Warning);
            }
        }
        if let Some(max) = self.max_value {
            if value > max {
                return Some(BreachLevel::Warning);
            }
        }

        None
    }

    /// Evaluate a raw telemetry value. Values that do not parse as a number
    /// (booleans, strings) never breach.
    pub fn evaluate_raw(&self, raw: &str) -> Option<BreachLevel> {
        raw.trim().parse::<f64>().ok().and_then(|v| self.evaluate(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ThresholdConfig {
        ThresholdConfig {
            warning_level: Some(80.0),
            critical_level: Some(95.0),
            min_value: Some(10.0),
            max_value: Some(120.0),
            active: true,
        }
    }

    #[test]
    fn critical_takes_priority_over_warning() {
        let cfg = config();
        assert_eq!(cfg.evaluate(100.0), Some(BreachLevel::Critical));
        assert_eq!(cfg.evaluate(95.0), Some(BreachLevel::Critical));
        assert_eq!(cfg.evaluate(80.0), Some(BreachLevel::Warning));
        assert_eq!(cfg.evaluate(50.0), None);
    }

    #[test]
    fn min_and_max_bounds_are_warnings() {
        let cfg = config();
        assert_eq!(cfg.evaluate(5.0), Some(BreachLevel::Warning));
        // 121 exceeds max but also exceeds warning_level; warning either way.
        assert_eq!(cfg.evaluate(9.99), Some(BreachLevel::Warning));
        // Exactly at the min bound is acceptable (strict less-than).
        assert_eq!(cfg.evaluate(10.0), None);
    }

    #[test]
    fn inactive_thresholds_never_breach() {
        let cfg = ThresholdConfig { active: false, ..config() };
        assert_eq!(cfg.evaluate(1000.0), None);
    }

    #[test]
    fn unset_levels_are_ignored() {
        let cfg = ThresholdConfig {
            warning_level: None,
            critical_level: Some(50.0),
            min_value: None,
            max_value: None,
            active: true,
        };
        assert_eq!(cfg.evaluate(49.0), None);
        assert_eq!(cfg.evaluate(50.0), Some(BreachLevel::Critical));
    }

    #[test]
    fn non_numeric_values_never_breach() {
        let cfg = config();
        assert_eq!(cfg.evaluate_raw("true"), None);
        assert_eq!(cfg.evaluate_raw("RUNNING"), None);
        assert_eq!(cfg.evaluate_raw(""), None);
        assert_eq!(cfg.evaluate_raw(" 96.5 "), Some(BreachLevel::Critical));
    }
}
