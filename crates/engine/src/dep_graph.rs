//! Dependency graph for formula cells.
//!
//! Tracks, per position, the cells its formula reads (outgoing edges)
//! and the cells whose formulas read it (incoming edges).
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** B ∈ refs[A] iff A ∈ dependents[B].
//! 2. **No dangling entries:** empty sets are removed, not stored.
//! 3. **Atomic updates:** `replace_refs` is the only mutator and touches
//!    both maps.
//! 4. Every stored position fits the addressable grid (out-of-range
//!    references are never installed; they cannot change, so they never
//!    invalidate anything).

use rustc_hash::{FxHashMap, FxHashSet};

use tabula_core::Position;

#[derive(Debug, Default)]
pub struct DepGraph {
    /// Outgoing: for each formula cell, the sorted, deduplicated
    /// positions it reads.
    refs: FxHashMap<Position, Vec<Position>>,

    /// Incoming: for each referenced cell, the formula cells reading it.
    dependents: FxHashMap<Position, FxHashSet<Position>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed referenced set of a cell, in row-major order.
    pub fn referenced_cells(&self, cell: Position) -> &[Position] {
        self.refs.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The cells whose formulas read `cell`.
    pub fn dependents(&self, cell: Position) -> impl Iterator<Item = Position> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Replace all outgoing edges of `cell` atomically.
    ///
    /// Removes `cell` from every old target's dependent set, then
    /// installs the new sorted reference list and mirrors it into the
    /// targets' dependent sets. Pass an empty list to clear.
    pub fn replace_refs(&mut self, cell: Position, new_refs: Vec<Position>) {
        debug_assert!(new_refs.windows(2).all(|w| w[0] < w[1]), "refs sorted+deduped");

        if let Some(old_refs) = self.refs.remove(&cell) {
            for target in old_refs {
                if let Some(set) = self.dependents.get_mut(&target) {
                    set.remove(&cell);
                    if set.is_empty() {
                        self.dependents.remove(&target);
                    }
                }
            }
        }

        if new_refs.is_empty() {
            return;
        }

        for &target in &new_refs {
            self.dependents.entry(target).or_default().insert(cell);
        }
        self.refs.insert(cell, new_refs);
    }

    /// Drop all outgoing edges of `cell` (cleared or no longer a formula).
    pub fn clear_refs(&mut self, cell: Position) {
        self.replace_refs(cell, Vec::new());
    }
}
