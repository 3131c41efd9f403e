//! Comparison state
//!
//! Cycle-detection bookkeeping for a single recursive equality check. The
//! state is an immutable append-only stack of identity pairs: pushing returns
//! a new state that shares its tail with the parent, so sibling branches never
//! observe each other's pairs.

use std::sync::Arc;

#[derive(Debug)]
struct VisitedNode {
    pair: (usize, usize),
    next: Option<Arc<VisitedNode>>,
}

/// The in-progress pair stack carried through one recursive comparison.
#[derive(Debug, Clone)]
pub struct ComparisonState {
    top_level: bool,
    visited: Option<Arc<VisitedNode>>,
}

impl ComparisonState {
    /// Fresh state for a new top-level comparison.
    pub fn top_level() -> Self {
        Self {
            top_level: true,
            visited: None,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.top_level
    }

    /// Record that the identity pair `(a, b)` is being compared, returning the
    /// state to use while recursing into that pair's children. The parent
    /// state is untouched.
    pub fn push(&self, a: usize, b: usize) -> Self {
        Self {
            top_level: false,
            visited: Some(Arc::new(VisitedNode {
                pair: (a, b),
                next: self.visited.clone(),
            })),
        }
    }

    /// Descend without recording a pair (for containers that have no identity,
    /// such as tuples). Clears the top-level flag.
    pub fn descend(&self) -> Self {
        Self {
            top_level: false,
            visited: self.visited.clone(),
        }
    }

    /// Whether the exact identity pair `(a, b)` is already on the current
    /// comparison path. True means we have re-entered a pair mid-comparison,
    /// i.e. a reference cycle.
    pub fn did_compare(&self, a: usize, b: usize) -> bool {
        let mut node = self.visited.as_deref();
        while let Some(n) = node {
            if n.pair == (a, b) {
                return true;
            }
            node = n.next.as_deref();
        }
        false
    }
}

impl Default for ComparisonState {
    fn default() -> Self {
        Self::top_level()
    }
}

// =============================================================================
// TESTS
// =============================================================================
