//! Read-only sheet access for formula evaluation.

use crate::position::Position;
use crate::value::Value;

/// The window a formula gets onto the sheet while evaluating.
///
/// `None` means the position has never been written (distinct from an
/// out-of-range position, which callers reject before consulting the
/// view). Implementations may memoize behind this call, but must not
/// change any cell observably.
pub trait SheetView {
    fn cell_value(&self, pos: Position) -> Option<Value>;
}
