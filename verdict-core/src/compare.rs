//! Recursive structural equality via an ordered comparer chain
//!
//! `EqualityComparer` walks a fixed, explicitly ordered list of type-specific
//! strategies. Each strategy either decides the comparison or abstains and
//! defers to the next entry. More specific strategies (tuples, custom
//! structural equality) sit before generic container comparison, which sits
//! before the member-by-member record fallback.

use crate::error::ToleranceError;
use crate::state::ComparisonState;
use crate::tolerance::Tolerance;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// CHAIN PROTOCOL
// ============================================================================

/// Tri-state outcome of one chain entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// This entry owns the pair and has decided.
    Decided(bool),
    /// Not this entry's pair; defer to the next entry.
    Abstain,
}

/// One equality strategy in the chain. Entries may recurse back into the
/// supplied `EqualityComparer` for child comparisons, passing a descendant of
/// `state` so the cycle guard sees the whole path.
pub trait ChainComparer: fmt::Debug + Send + Sync {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        comparer: &EqualityComparer,
        tolerance: &Tolerance,
        state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError>;
}

// ============================================================================
// EQUALITY COMPARER
// ============================================================================

/// The engine driving a full recursive equality check.
#[derive(Debug)]
pub struct EqualityComparer {
    chain: Vec<Box<dyn ChainComparer>>,
    unordered: bool,
}

impl Default for EqualityComparer {
    fn default() -> Self {
        Self::new()
    }
}

impl EqualityComparer {
    pub fn new() -> Self {
        Self {
            // Order is significant and fixed.
            chain: vec![
                Box::new(NumericComparer),
                Box::new(StringComparer),
                Box::new(BoolComparer),
                Box::new(DurationComparer),
                Box::new(TupleComparer),
                Box::new(EquatableComparer),
                Box::new(ListComparer),
                Box::new(MapComparer),
                Box::new(RecordComparer),
            ],
            unordered: false,
        }
    }

    /// Compare collections as unordered sets: each actual element consumes
    /// exactly one unmatched expected element.
    pub fn unordered(mut self) -> Self {
        self.unordered = true;
        self
    }

    pub fn is_unordered(&self) -> bool {
        self.unordered
    }

    /// Top-level entry point.
    pub fn are_equal(
        &self,
        actual: &Value,
        expected: &Value,
        tolerance: &Tolerance,
    ) -> Result<bool, ToleranceError> {
        self.equal(actual, expected, tolerance, &ComparisonState::top_level())
    }

    /// Recursive entry point used by chain entries for child comparisons.
    pub fn equal(
        &self,
        actual: &Value,
        expected: &Value,
        tolerance: &Tolerance,
        state: &ComparisonState,
    ) -> Result<bool, ToleranceError> {
        // Null fast path.
        match (actual, expected) {
            (Value::Null, Value::Null) => return Ok(true),
            (Value::Null, _) | (_, Value::Null) => return Ok(false),
            _ => {}
        }

        // Cycle guard: a pair already in progress on this path is considered
        // self-consistent, not infinitely unequal.
        if let (Some(a), Some(b)) = (actual.identity(), expected.identity()) {
            if state.did_compare(a, b) {
                return Ok(true);
            }
        }

        for entry in &self.chain {
            match entry.compare(actual, expected, self, tolerance, state)? {
                Comparison::Decided(result) => return Ok(result),
                Comparison::Abstain => continue,
            }
        }

        // No entry claimed the pair: the kinds do not match.
        Ok(false)
    }

    /// State for recursing into the children of an identity-bearing pair.
    fn child_state(
        &self,
        actual: &Value,
        expected: &Value,
        state: &ComparisonState,
    ) -> ComparisonState {
        match (actual.identity(), expected.identity()) {
            (Some(a), Some(b)) => state.push(a, b),
            _ => state.descend(),
        }
    }
}

// ============================================================================
// SCALAR COMPARERS
// ============================================================================

/// Int/Float comparison with tolerance windows. Mixed int/float pairs compare
/// as f64. The window is always derived from the expected operand.
#[derive(Debug)]
struct NumericComparer;

impl ChainComparer for NumericComparer {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        _comparer: &EqualityComparer,
        tolerance: &Tolerance,
        _state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError> {
        if !actual.is_numeric() || !expected.is_numeric() {
            return Ok(Comparison::Abstain);
        }
        if tolerance.is_exact() {
            let equal = match (actual, expected) {
                (Value::Int(a), Value::Int(e)) => a == e,
                _ => {
                    // as_f64 is Some for both: is_numeric was checked above.
                    actual.as_f64() == expected.as_f64()
                }
            };
            return Ok(Comparison::Decided(equal));
        }
        let bounds = tolerance.apply(expected)?;
        Ok(Comparison::Decided(bounds.contains(actual)))
    }
}

#[derive(Debug)]
struct StringComparer;

impl ChainComparer for StringComparer {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        _comparer: &EqualityComparer,
        tolerance: &Tolerance,
        _state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError> {
        match (actual, expected) {
            (Value::Str(a), Value::Str(e)) => {
                if !tolerance.is_exact() {
                    return Err(ToleranceError::Incompatible {
                        mode: *tolerance.mode(),
                        kind: expected.kind(),
                    });
                }
                Ok(Comparison::Decided(a == e))
            }
            _ => Ok(Comparison::Abstain),
        }
    }
}

#[derive(Debug)]
struct BoolComparer;

impl ChainComparer for BoolComparer {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        _comparer: &EqualityComparer,
        tolerance: &Tolerance,
        _state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError> {
        match (actual, expected) {
            (Value::Bool(a), Value::Bool(e)) => {
                if !tolerance.is_exact() {
                    return Err(ToleranceError::Incompatible {
                        mode: *tolerance.mode(),
                        kind: expected.kind(),
                    });
                }
                Ok(Comparison::Decided(a == e))
            }
            _ => Ok(Comparison::Abstain),
        }
    }
}

#[derive(Debug)]
struct DurationComparer;

impl ChainComparer for DurationComparer {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        _comparer: &EqualityComparer,
        tolerance: &Tolerance,
        _state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError> {
        match (actual, expected) {
            (Value::Duration(a), Value::Duration(e)) => {
                if tolerance.is_exact() {
                    return Ok(Comparison::Decided(a == e));
                }
                let bounds = tolerance.apply(expected)?;
                Ok(Comparison::Decided(bounds.contains(actual)))
            }
            _ => Ok(Comparison::Abstain),
        }
    }
}

// ============================================================================
// STRUCTURED COMPARERS
// ============================================================================

/// Positional comparison: arity first (mismatch is unequal, not an error),
/// then each slot recursively through the chain.
#[derive(Debug)]
struct TupleComparer;

impl ChainComparer for TupleComparer {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        comparer: &EqualityComparer,
        tolerance: &Tolerance,
        state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError> {
        match (actual, expected) {
            (Value::Tuple(a), Value::Tuple(e)) => {
                if a.len() != e.len() {
                    return Ok(Comparison::Decided(false));
                }
                let child = state.descend();
                for (slot_a, slot_e) in a.iter().zip(e.iter()) {
                    if !comparer.equal(slot_a, slot_e, tolerance, &child)? {
                        return Ok(Comparison::Decided(false));
                    }
                }
                Ok(Comparison::Decided(true))
            }
            _ => Ok(Comparison::Abstain),
        }
    }
}

/// Custom structural equality. Tries both directions and accepts either,
/// since the two implementations are not guaranteed symmetry-aware. Skipped
/// at the top level of an unordered (compare-as-collection) pass so the
/// collection comparer owns that comparison.
#[derive(Debug)]
struct EquatableComparer;

impl ChainComparer for EquatableComparer {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        comparer: &EqualityComparer,
        tolerance: &Tolerance,
        state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError> {
        let involves_custom =
            matches!(actual, Value::Custom(_)) || matches!(expected, Value::Custom(_));
        if !involves_custom {
            return Ok(Comparison::Abstain);
        }
        if comparer.is_unordered() && state.is_top_level() {
            return Ok(Comparison::Abstain);
        }
        let child = comparer.child_state(actual, expected, state);
        if let Value::Custom(a) = actual {
            if a.structural_eq(expected, comparer, tolerance, &child)? {
                return Ok(Comparison::Decided(true));
            }
        }
        if let Value::Custom(e) = expected {
            if e.structural_eq(actual, comparer, tolerance, &child)? {
                return Ok(Comparison::Decided(true));
            }
        }
        Ok(Comparison::Decided(false))
    }
}

/// Element-wise comparison in enumeration order, or bipartite matching in
/// unordered mode. Cardinality mismatch is unequal, never an error.
#[derive(Debug)]
struct ListComparer;

impl ChainComparer for ListComparer {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        comparer: &EqualityComparer,
        tolerance: &Tolerance,
        state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError> {
        match (actual, expected) {
            (Value::List(a), Value::List(e)) => {
                let items_a = a.snapshot();
                let items_e = e.snapshot();
                if items_a.len() != items_e.len() {
                    return Ok(Comparison::Decided(false));
                }
                let child = comparer.child_state(actual, expected, state);
                if comparer.is_unordered() {
                    return Ok(Comparison::Decided(match_unordered(
                        &items_a, &items_e, comparer, tolerance, &child,
                    )?));
                }
                for (item_a, item_e) in items_a.iter().zip(items_e.iter()) {
                    if !comparer.equal(item_a, item_e, tolerance, &child)? {
                        return Ok(Comparison::Decided(false));
                    }
                }
                Ok(Comparison::Decided(true))
            }
            _ => Ok(Comparison::Abstain),
        }
    }
}

/// Bipartite matching: each actual element consumes exactly one unmatched
/// expected element. O(n²) worst case, fine at assertion scale.
fn match_unordered(
    actual: &[Value],
    expected: &[Value],
    comparer: &EqualityComparer,
    tolerance: &Tolerance,
    state: &ComparisonState,
) -> Result<bool, ToleranceError> {
    let mut remaining: Vec<&Value> = expected.iter().collect();
    for item in actual {
        let mut matched = None;
        for (i, candidate) in remaining.iter().enumerate() {
            if comparer.equal(item, candidate, tolerance, state)? {
                matched = Some(i);
                break;
            }
        }
        match matched {
            Some(i) => {
                remaining.swap_remove(i);
            }
            None => return Ok(false),
        }
    }
    Ok(remaining.is_empty())
}

/// Dictionary comparison: identical key sets, then per-key recursive value
/// comparison.
#[derive(Debug)]
struct MapComparer;

impl ChainComparer for MapComparer {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        comparer: &EqualityComparer,
        tolerance: &Tolerance,
        state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError> {
        match (actual, expected) {
            (Value::Map(a), Value::Map(e)) => {
                let child = comparer.child_state(actual, expected, state);
                entries_equal(&a.snapshot(), &e.snapshot(), comparer, tolerance, &child)
                    .map(Comparison::Decided)
            }
            _ => Ok(Comparison::Abstain),
        }
    }
}

/// Member-by-member fallback for records: every field must match by name
/// and value.
#[derive(Debug)]
struct RecordComparer;

impl ChainComparer for RecordComparer {
    fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        comparer: &EqualityComparer,
        tolerance: &Tolerance,
        state: &ComparisonState,
    ) -> Result<Comparison, ToleranceError> {
        match (actual, expected) {
            (Value::Record(a), Value::Record(e)) => {
                let child = comparer.child_state(actual, expected, state);
                entries_equal(&a.snapshot(), &e.snapshot(), comparer, tolerance, &child)
                    .map(Comparison::Decided)
            }
            _ => Ok(Comparison::Abstain),
        }
    }
}

fn entries_equal(
    actual: &BTreeMap<String, Value>,
    expected: &BTreeMap<String, Value>,
    comparer: &EqualityComparer,
    tolerance: &Tolerance,
    state: &ComparisonState,
) -> Result<bool, ToleranceError> {
    if actual.len() != expected.len() {
        return Ok(false);
    }
    for (key, expected_value) in expected {
        match actual.get(key) {
            Some(actual_value) => {
                if !comparer.equal(actual_value, expected_value, tolerance, state)? {
                    return Ok(false);
                }
            }
            None => return Ok(false),
        }
    }
    Ok(true)
}

// =============================================================================
// TESTS
// =============================================================================
