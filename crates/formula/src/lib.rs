//! Formula subsystem: parse expression text into an AST, evaluate it
//! against a read-only sheet view, report the cells it references, and
//! render it back to canonical text.
//!
//! The grammar covers numbers, A1 cell references, unary `+`/`-`, binary
//! `+ - * /`, and parentheses. Evaluation never fails as `Err`: domain
//! faults (division by zero, bad reference, bad operand) come back as
//! error *values* that propagate through arithmetic.

pub mod eval;
pub mod parser;
pub mod refs;
pub mod render;

use tabula_core::{Position, SheetView, Value};

pub use parser::{Expr, ParseError};

/// A parsed formula: the AST plus its precomputed reference set.
#[derive(Clone, Debug)]
pub struct Formula {
    ast: Expr,
    refs: Vec<Position>,
}

impl Formula {
    /// Parse expression text (without the leading `=` sigil).
    pub fn parse(expression: &str) -> Result<Formula, ParseError> {
        let ast = parser::parse(expression)?;
        let refs = refs::extract_refs(&ast);
        Ok(Formula { ast, refs })
    }

    /// Evaluate against a sheet view. Domain errors come back as values.
    pub fn evaluate(&self, sheet: &dyn SheetView) -> Value {
        eval::evaluate(&self.ast, sheet)
    }

    /// Positions this formula reads: sorted, deduplicated, including
    /// references beyond the addressable grid (callers filter those).
    pub fn referenced_cells(&self) -> &[Position] {
        &self.refs
    }

    /// Canonical rendering without the sigil: minimal parentheses,
    /// uppercase references, no whitespace.
    pub fn canonical_text(&self) -> String {
        render::render(&self.ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tabula_core::{CellError, Position};

    /// Fixed-value view for evaluator tests.
    struct MapView(Vec<(Position, Value)>);

    impl SheetView for MapView {
        fn cell_value(&self, pos: Position) -> Option<Value> {
            self.0.iter().find(|(p, _)| *p == pos).map(|(_, v)| v.clone())
        }
    }

    fn a1(name: &str) -> Position {
        Position::from_a1(name).unwrap()
    }

    #[test]
    fn test_parse_evaluate_literal() {
        let f = Formula::parse("1+2*3").unwrap();
        let empty = MapView(Vec::new());
        assert_eq!(f.evaluate(&empty), Value::Number(7.0));
        assert!(f.referenced_cells().is_empty());
    }

    #[test]
    fn test_references_sorted_and_deduped() {
        let f = Formula::parse("B2+A1+B2+A10").unwrap();
        assert_eq!(
            f.referenced_cells(),
            &[a1("A1"), a1("B2"), a1("A10")],
        );
    }

    #[test]
    fn test_evaluate_with_cell_values() {
        let f = Formula::parse("A1*2+B1").unwrap();
        let view = MapView(vec![
            (a1("A1"), Value::Number(5.0)),
            (a1("B1"), Value::Text("3".to_string())),
        ]);
        assert_eq!(f.evaluate(&view), Value::Number(13.0));
    }

    #[test]
    fn test_error_value_propagates() {
        let f = Formula::parse("A1+1").unwrap();
        let view = MapView(vec![(a1("A1"), Value::Error(CellError::DivZero))]);
        assert_eq!(f.evaluate(&view), Value::Error(CellError::DivZero));
    }

    #[test]
    fn test_canonical_round_trip() {
        let f = Formula::parse(" (1 + 2) * a1 ").unwrap();
        assert_eq!(f.canonical_text(), "(1+2)*A1");
        let again = Formula::parse(&f.canonical_text()).unwrap();
        assert_eq!(again.canonical_text(), f.canonical_text());
    }
}
