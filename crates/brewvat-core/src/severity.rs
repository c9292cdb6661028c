//! Temperature severity classification.
//!
//! Pure classification of a single reading into an ordered danger tier.
//! No state, no I/O -- debounce and cooldown decisions live in
//! [`crate::alerts`].

use serde::{Deserialize, Serialize};

/// Readings outside this span are treated as sensor faults / sentinels.
const DOMAIN_MIN_F: f64 = 32.0;
const DOMAIN_MAX_F: f64 = 150.0;

/// Ordered danger tier for a temperature reading.
///
/// `Unknown` and `Optimal` never trigger banners or physical alerts;
/// everything above `Optimal` is actionable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Unknown,
    Optimal,
    Warning,
    Critical,
    Lethal,
}

impl Severity {
    /// Whether this tier should surface to the user at all.
    pub fn is_actionable(&self) -> bool {
        *self >= Severity::Warning
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Optimal => "optimal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
            Severity::Lethal => "lethal",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temperature band boundaries in Fahrenheit.
///
/// Defaults target kombucha fermentation: 68-78 F is the happy band, heat
/// kills the culture faster than cold stalls it, so only the hot side
/// escalates to `Lethal`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_lethal_above")]
    pub lethal_above_f: f64,
    #[serde(default = "default_critical_above")]
    pub critical_above_f: f64,
    #[serde(default = "default_warning_above")]
    pub warning_above_f: f64,
    #[serde(default = "default_warning_below")]
    pub warning_below_f: f64,
    #[serde(default = "default_critical_below")]
    pub critical_below_f: f64,
}

fn default_lethal_above() -> f64 {
    95.0
}
fn default_critical_above() -> f64 {
    86.0
}
fn default_warning_above() -> f64 {
    78.0
}
fn default_warning_below() -> f64 {
    68.0
}
fn default_critical_below() -> f64 {
    60.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            lethal_above_f: default_lethal_above(),
            critical_above_f: default_critical_above(),
            warning_above_f: default_warning_above(),
            warning_below_f: default_warning_below(),
            critical_below_f: default_critical_below(),
        }
    }
}

/// A classified reading, ready for the alert pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub level: Severity,
    pub title: &'static str,
    pub message: &'static str,
    /// The raw temperature that produced this classification, in Fahrenheit.
    pub value_f: f64,
}

/// Classify a temperature reading.
///
/// Total and deterministic: every float maps to exactly one tier.
/// Non-finite values and readings outside the plausible sensor domain
/// (hardware sentinels like -999) come back as `Unknown`.
pub fn evaluate(value_f: f64, thresholds: &Thresholds) -> Reading {
    let (level, title, message) = if !value_f.is_finite()
        || !(DOMAIN_MIN_F..=DOMAIN_MAX_F).contains(&value_f)
    {
        (
            Severity::Unknown,
            "No Reading",
            "Sensor value out of range. Check the probe.",
        )
    } else if value_f >= thresholds.lethal_above_f {
        (
            Severity::Lethal,
            "Lethal Heat",
            "Temperature is killing the culture. Cool the vessel now.",
        )
    } else if value_f >= thresholds.critical_above_f {
        (
            Severity::Critical,
            "Critically Hot",
            "Brew is overheating. Move it somewhere cooler.",
        )
    } else if value_f > thresholds.warning_above_f {
        (
            Severity::Warning,
            "Running Hot",
            "Above the ideal band. Fermentation will run fast and sour.",
        )
    } else if value_f < thresholds.critical_below_f {
        (
            Severity::Critical,
            "Critically Cold",
            "Fermentation has stalled. Warm the vessel.",
        )
    } else if value_f < thresholds.warning_below_f {
        (
            Severity::Warning,
            "Running Cold",
            "Below the ideal band. Fermentation is slowing down.",
        )
    } else {
        (
            Severity::Optimal,
            "Optimal",
            "Temperature is in the ideal fermentation band.",
        )
    };

    Reading {
        level,
        title,
        message,
        value_f,
    }
}

/// Classify with the default kombucha thresholds.
pub fn evaluate_default(value_f: f64) -> Reading {
    evaluate(value_f, &Thresholds::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        assert!(Severity::Unknown < Severity::Optimal);
        assert!(Severity::Optimal < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert!(Severity::Critical < Severity::Lethal);
    }

    #[test]
    fn only_warning_and_above_are_actionable() {
        assert!(!Severity::Unknown.is_actionable());
        assert!(!Severity::Optimal.is_actionable());
        assert!(Severity::Warning.is_actionable());
        assert!(Severity::Critical.is_actionable());
        assert!(Severity::Lethal.is_actionable());
    }

    #[test]
    fn classifies_each_band() {
        assert_eq!(evaluate_default(72.0).level, Severity::Optimal);
        assert_eq!(evaluate_default(80.0).level, Severity::Warning);
        assert_eq!(evaluate_default(88.0).level, Severity::Critical);
        assert_eq!(evaluate_default(97.5).level, Severity::Lethal);
        assert_eq!(evaluate_default(65.0).level, Severity::Warning);
        assert_eq!(evaluate_default(55.0).level, Severity::Critical);
    }

    #[test]
    fn boundary_values() {
        // Hot boundaries are inclusive on the severe side, the warning
        // band boundaries belong to the optimal band.
        assert_eq!(evaluate_default(95.0).level, Severity::Lethal);
        assert_eq!(evaluate_default(86.0).level, Severity::Critical);
        assert_eq!(evaluate_default(78.0).level, Severity::Optimal);
        assert_eq!(evaluate_default(68.0).level, Severity::Optimal);
        assert_eq!(evaluate_default(60.0).level, Severity::Warning);
    }

    #[test]
    fn sentinels_and_garbage_are_unknown() {
        assert_eq!(evaluate_default(f64::NAN).level, Severity::Unknown);
        assert_eq!(evaluate_default(f64::INFINITY).level, Severity::Unknown);
        assert_eq!(evaluate_default(-999.0).level, Severity::Unknown);
        assert_eq!(evaluate_default(400.0).level, Severity::Unknown);
    }

    #[test]
    fn same_input_same_output() {
        let a = evaluate_default(83.2);
        let b = evaluate_default(83.2);
        assert_eq!(a, b);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_float_classifies_to_exactly_one_tier(value in proptest::num::f64::ANY) {
                let reading = evaluate_default(value);
                prop_assert_eq!(reading.value_f.to_bits(), value.to_bits());
                if !value.is_finite() || !(DOMAIN_MIN_F..=DOMAIN_MAX_F).contains(&value) {
                    prop_assert_eq!(reading.level, Severity::Unknown);
                } else {
                    prop_assert_ne!(reading.level, Severity::Unknown);
                }
            }

            #[test]
            fn hotter_in_domain_never_ranks_lower(a in 32.0f64..=150.0, b in 32.0f64..=150.0) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                // Monotonic on the hot side of the optimal band.
                if lo >= 73.0 {
                    prop_assert!(evaluate_default(hi).level >= evaluate_default(lo).level);
                }
            }
        }
    }
}
