//! Invalidation reporting.

/// What the last mutating call invalidated.
///
/// `cells_invalidated` counts distinct cells whose cache went from
/// present to cleared, the edited cell included. The short-circuit rule
/// means a diamond-shaped graph counts its sink exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecalcStats {
    pub cells_invalidated: usize,
}
