//! Structural edit errors.
//!
//! These abort the whole requested mutation with no observable side
//! effects. Evaluation faults (`#DIV/0!` and friends) are *values*, not
//! errors - see `tabula_core::CellError`.

use thiserror::Error;

use tabula_core::Position;
use tabula_formula::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    /// Row or column beyond the addressable grid.
    #[error("invalid position {0}")]
    InvalidPosition(Position),

    /// Text after the formula sigil failed to parse.
    #[error("formula syntax: {0}")]
    Syntax(#[from] ParseError),

    /// Committing the formula would close a reference cycle through the
    /// edited cell.
    #[error("circular dependency through {0}")]
    CircularDependency(Position),
}
