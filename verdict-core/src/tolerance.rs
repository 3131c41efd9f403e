//! Numeric and time tolerance windows
//!
//! A tolerance relaxes equality into a `[lower, upper]` window derived from
//! the expected operand. The window is always computed from the expected side:
//! tolerance answers "how far may the actual deviate from the expected".

use crate::error::ToleranceError;
use crate::value::{Value, ValueKind};
use std::time::Duration;

// ============================================================================
// TOLERANCE
// ============================================================================

/// How the slack window is derived.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToleranceMode {
    /// No slack: the window degenerates to the expected value itself.
    #[default]
    Exact,
    /// Fixed amount: expected ± amount.
    Linear(f64),
    /// Percentage of the expected magnitude: expected ± amount/100 · |expected|.
    Percent(f64),
    /// Floating-point steps: expected widened by N representable values.
    Ulps(u32),
    /// Time slack for duration values.
    Duration(Duration),
}

/// An immutable tolerance. `Tolerance::default()` is the exact singleton used
/// when no caller-specified tolerance is active.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tolerance {
    mode: ToleranceMode,
}

impl Tolerance {
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn linear(amount: f64) -> Self {
        Self {
            mode: ToleranceMode::Linear(amount),
        }
    }

    pub fn percent(amount: f64) -> Self {
        Self {
            mode: ToleranceMode::Percent(amount),
        }
    }

    pub fn ulps(steps: u32) -> Self {
        Self {
            mode: ToleranceMode::Ulps(steps),
        }
    }

    pub fn duration(slack: Duration) -> Self {
        Self {
            mode: ToleranceMode::Duration(slack),
        }
    }

    pub fn mode(&self) -> &ToleranceMode {
        &self.mode
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.mode, ToleranceMode::Exact)
    }

    /// Derive the `[lower, upper]` window around `expected`.
    ///
    /// Errors on a negative amount, and when a non-exact mode is applied to a
    /// value kind it cannot widen (tolerance misuse is a configuration error,
    /// not an assertion failure). The exact mode never errors: on kinds with
    /// no numeric window it degenerates to the expected value itself.
    pub fn apply(&self, expected: &Value) -> Result<Bounds, ToleranceError> {
        match self.mode {
            ToleranceMode::Exact => match expected {
                Value::Duration(d) => Ok(Bounds::Duration {
                    lower: *d,
                    upper: *d,
                }),
                _ => match expected.as_f64() {
                    Some(center) => Ok(Bounds::Numeric {
                        lower: center,
                        upper: center,
                    }),
                    None => Ok(Bounds::Exact(expected.clone())),
                },
            },
            ToleranceMode::Linear(amount) => {
                self.check_amount(amount)?;
                let center = self.numeric_operand(expected)?;
                Ok(Bounds::Numeric {
                    lower: center - amount,
                    upper: center + amount,
                })
            }
            ToleranceMode::Percent(amount) => {
                self.check_amount(amount)?;
                let center = self.numeric_operand(expected)?;
                let slack = amount / 100.0 * center.abs();
                Ok(Bounds::Numeric {
                    lower: center - slack,
                    upper: center + slack,
                })
            }
            ToleranceMode::Ulps(steps) => {
                let center = self.numeric_operand(expected)?;
                if !center.is_finite() {
                    return Ok(Bounds::Numeric {
                        lower: center,
                        upper: center,
                    });
                }
                Ok(Bounds::Numeric {
                    lower: ulps_offset(center, -(steps as i64)),
                    upper: ulps_offset(center, steps as i64),
                })
            }
            ToleranceMode::Duration(slack) => match expected {
                Value::Duration(d) => Ok(Bounds::Duration {
                    lower: d.saturating_sub(slack),
                    upper: d.saturating_add(slack),
                }),
                other => Err(ToleranceError::Incompatible {
                    mode: self.mode,
                    kind: other.kind(),
                }),
            },
        }
    }

    fn check_amount(&self, amount: f64) -> Result<(), ToleranceError> {
        if amount < 0.0 {
            return Err(ToleranceError::NegativeAmount { amount });
        }
        Ok(())
    }

    fn numeric_operand(&self, expected: &Value) -> Result<f64, ToleranceError> {
        expected.as_f64().ok_or(ToleranceError::Incompatible {
            mode: self.mode,
            kind: expected.kind(),
        })
    }
}

/// Step `value` by `steps` adjacent representable floats (negative = down).
fn ulps_offset(value: f64, steps: i64) -> f64 {
    // Map the bit pattern onto a monotone integer line so ordinary integer
    // arithmetic walks adjacent floats across the zero boundary.
    let bits = value.to_bits() as i64;
    let ordered = if bits < 0 { i64::MIN - bits } else { bits };
    let shifted = ordered.saturating_add(steps);
    let out_bits = if shifted < 0 {
        (i64::MIN - shifted) as u64
    } else {
        shifted as u64
    };
    f64::from_bits(out_bits)
}

// ============================================================================
// BOUNDS
// ============================================================================

/// The derived `[lower, upper]` window.
#[derive(Debug, Clone)]
pub enum Bounds {
    Numeric { lower: f64, upper: f64 },
    Duration { lower: Duration, upper: Duration },
    /// Degenerate window produced by the exact mode on kinds with no numeric
    /// window: only the expected value itself is inside (scalars by value,
    /// containers by identity; structural container equality belongs to the
    /// comparer chain, not to a bounds check).
    Exact(Value),
}

impl Bounds {
    /// Whether the actual value falls inside the window.
    /// Kind mismatches (numeric window vs duration actual) are simply outside.
    pub fn contains(&self, actual: &Value) -> bool {
        match self {
            Bounds::Numeric { lower, upper } => match actual.as_f64() {
                Some(a) => *lower <= a && a <= *upper,
                None => false,
            },
            Bounds::Duration { lower, upper } => match actual {
                Value::Duration(a) => lower <= a && a <= upper,
                _ => false,
            },
            Bounds::Exact(expected) => degenerate_eq(expected, actual),
        }
    }
}

impl PartialEq for Bounds {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Bounds::Numeric { lower: a, upper: b },
                Bounds::Numeric { lower: c, upper: d },
            ) => a == c && b == d,
            (
                Bounds::Duration { lower: a, upper: b },
                Bounds::Duration { lower: c, upper: d },
            ) => a == c && b == d,
            (Bounds::Exact(a), Bounds::Exact(b)) => degenerate_eq(a, b),
            _ => false,
        }
    }
}

fn degenerate_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Duration(x), Value::Duration(y)) => x == y,
        _ => match (a.identity(), b.identity()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kind_of(err: &ToleranceError) -> ValueKind {
        match err {
            ToleranceError::Incompatible { kind, .. } => *kind,
            other => panic!("expected Incompatible, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_window_degenerates_to_expected() {
        let bounds = Tolerance::exact().apply(&Value::Int(5)).unwrap();
        assert_eq!(
            bounds,
            Bounds::Numeric {
                lower: 5.0,
                upper: 5.0
            }
        );
        assert!(bounds.contains(&Value::Int(5)));
        assert!(!bounds.contains(&Value::Int(6)));
    }

    #[test]
    fn test_linear_window() {
        let bounds = Tolerance::linear(0.5).apply(&Value::Float(2.0)).unwrap();
        assert!(bounds.contains(&Value::Float(1.5)));
        assert!(bounds.contains(&Value::Float(2.5)));
        assert!(!bounds.contains(&Value::Float(2.51)));
    }

    #[test]
    fn test_percent_window_scales_with_magnitude() {
        let bounds = Tolerance::percent(10.0).apply(&Value::Float(200.0)).unwrap();
        assert_eq!(
            bounds,
            Bounds::Numeric {
                lower: 180.0,
                upper: 220.0
            }
        );
    }

    #[test]
    fn test_percent_window_on_negative_expected() {
        let bounds = Tolerance::percent(50.0).apply(&Value::Float(-2.0)).unwrap();
        assert!(bounds.contains(&Value::Float(-1.5)));
        assert!(bounds.contains(&Value::Float(-3.0)));
        assert!(!bounds.contains(&Value::Float(-3.1)));
    }

    #[test]
    fn test_negative_amount_is_an_error() {
        let err = Tolerance::linear(-1.0).apply(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, ToleranceError::NegativeAmount { .. }));
        let err = Tolerance::percent(-5.0).apply(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, ToleranceError::NegativeAmount { .. }));
    }

    #[test]
    fn test_non_numeric_operand_is_an_error() {
        let err = Tolerance::linear(1.0)
            .apply(&Value::Str("abc".into()))
            .unwrap_err();
        assert_eq!(kind_of(&err), ValueKind::Str);
    }

    #[test]
    fn test_exact_mode_degenerates_on_non_numeric_kinds() {
        let bounds = Tolerance::exact().apply(&Value::Str("abc".into())).unwrap();
        assert!(bounds.contains(&Value::Str("abc".into())));
        assert!(!bounds.contains(&Value::Str("abd".into())));
        assert!(!bounds.contains(&Value::Int(1)));

        let bounds = Tolerance::exact().apply(&Value::Bool(true)).unwrap();
        assert!(bounds.contains(&Value::Bool(true)));
        assert!(!bounds.contains(&Value::Bool(false)));

        assert!(Tolerance::exact()
            .apply(&Value::Null)
            .unwrap()
            .contains(&Value::Null));
    }

    #[test]
    fn test_exact_degenerate_window_matches_containers_by_identity() {
        use crate::value::ListHandle;
        let list = ListHandle::new(vec![Value::Int(1)]);
        let same = Value::List(list.clone());
        let other = Value::List(ListHandle::new(vec![Value::Int(1)]));
        let bounds = Tolerance::exact().apply(&Value::List(list)).unwrap();
        assert!(bounds.contains(&same));
        assert!(!bounds.contains(&other));
    }

    #[test]
    fn test_duration_window() {
        let bounds = Tolerance::duration(Duration::from_millis(50))
            .apply(&Value::Duration(Duration::from_millis(200)))
            .unwrap();
        assert!(bounds.contains(&Value::Duration(Duration::from_millis(150))));
        assert!(bounds.contains(&Value::Duration(Duration::from_millis(250))));
        assert!(!bounds.contains(&Value::Duration(Duration::from_millis(251))));
    }

    #[test]
    fn test_duration_mode_on_numeric_is_an_error() {
        let err = Tolerance::duration(Duration::from_secs(1))
            .apply(&Value::Int(3))
            .unwrap_err();
        assert_eq!(kind_of(&err), ValueKind::Int);
    }

    #[test]
    fn test_duration_window_saturates_at_zero() {
        let bounds = Tolerance::duration(Duration::from_secs(10))
            .apply(&Value::Duration(Duration::from_secs(1)))
            .unwrap();
        assert!(bounds.contains(&Value::Duration(Duration::ZERO)));
    }

    #[test]
    fn test_ulps_window_is_tight() {
        let bounds = Tolerance::ulps(1).apply(&Value::Float(1.0)).unwrap();
        let next = f64::from_bits(1.0f64.to_bits() + 1);
        let prev = f64::from_bits(1.0f64.to_bits() - 1);
        assert!(bounds.contains(&Value::Float(next)));
        assert!(bounds.contains(&Value::Float(prev)));
        assert!(!bounds.contains(&Value::Float(1.0 + 1e-10)));
    }

    #[test]
    fn test_ulps_offset_crosses_zero() {
        let below = ulps_offset(0.0, -2);
        let above = ulps_offset(0.0, 2);
        assert!(below < 0.0);
        assert!(above > 0.0);
        assert!(below < above);
    }

    #[test]
    fn test_tolerances_compare_by_mode_and_magnitude() {
        assert_eq!(Tolerance::linear(0.5), Tolerance::linear(0.5));
        assert_ne!(Tolerance::linear(0.5), Tolerance::linear(0.6));
        assert_ne!(Tolerance::linear(0.5), Tolerance::percent(0.5));
        assert_eq!(Tolerance::default(), Tolerance::exact());
    }

    proptest! {
        #[test]
        fn prop_linear_window_matches_arithmetic(
            expected in -1e6f64..1e6,
            actual in -1e6f64..1e6,
            amount in 0f64..1e3,
        ) {
            let bounds = Tolerance::linear(amount).apply(&Value::Float(expected)).unwrap();
            let inside = expected - amount <= actual && actual <= expected + amount;
            prop_assert_eq!(bounds.contains(&Value::Float(actual)), inside);
        }

        #[test]
        fn prop_expected_is_always_inside_its_own_window(
            expected in -1e6f64..1e6,
            amount in 0f64..1e3,
        ) {
            let bounds = Tolerance::linear(amount).apply(&Value::Float(expected)).unwrap();
            prop_assert!(bounds.contains(&Value::Float(expected)));
        }
    }
}
