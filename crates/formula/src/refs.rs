//! Reference extraction from a formula AST.
//!
//! Walks the expression and collects every position it reads, for
//! dependency-graph construction and cycle checking.

use rustc_hash::FxHashSet;

use tabula_core::Position;

use crate::parser::Expr;

/// Extract all cell references from an expression.
///
/// Returns a sorted, deduplicated list. References beyond the
/// addressable grid are included verbatim; callers decide how to treat
/// them (the engine skips them, the evaluator errors on them).
pub fn extract_refs(expr: &Expr) -> Vec<Position> {
    let mut refs = FxHashSet::default();
    collect_refs(expr, &mut refs);
    let mut out: Vec<Position> = refs.into_iter().collect();
    out.sort_unstable();
    out
}

fn collect_refs(expr: &Expr, refs: &mut FxHashSet<Position>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Ref(pos) => {
            refs.insert(*pos);
        }
        Expr::Unary { operand, .. } => collect_refs(operand, refs),
        Expr::Binary { left, right, .. } => {
            collect_refs(left, refs);
            collect_refs(right, refs);
        }
    }
}
