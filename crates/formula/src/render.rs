//! Canonical text rendering.
//!
//! Re-renders an AST with uppercase references, no whitespace, and
//! parentheses only where precedence or associativity demands them.
//! `(1+2)*3` keeps its parens; `1+(2*3)` loses them.

use std::fmt::Write;

use crate::parser::{Expr, Op, UnaryOp};

// Binding strength: additive 1, multiplicative 2, unary 3, atoms 4.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op: Op::Add | Op::Sub, .. } => 1,
        Expr::Binary { op: Op::Mul | Op::Div, .. } => 2,
        Expr::Unary { .. } => 3,
        Expr::Number(_) | Expr::Ref(_) => 4,
    }
}

/// Render an expression to canonical text (no leading sigil).
pub fn render(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        Expr::Ref(pos) => {
            let _ = write!(out, "{}", pos);
        }
        Expr::Unary { op, operand } => {
            out.push(match op {
                UnaryOp::Plus => '+',
                UnaryOp::Minus => '-',
            });
            write_child(out, operand, 3, false);
        }
        Expr::Binary { op, left, right } => {
            let prec = precedence(expr);
            // Subtraction and division are left-associative only, so an
            // equal-precedence right child keeps its parens: 8-(2-1).
            let rigid_right = matches!(op, Op::Sub | Op::Div);
            write_child(out, left, prec, false);
            out.push(match op {
                Op::Add => '+',
                Op::Sub => '-',
                Op::Mul => '*',
                Op::Div => '/',
            });
            write_child(out, right, prec, rigid_right);
        }
    }
}

fn write_child(out: &mut String, child: &Expr, parent_prec: u8, parenthesize_equal: bool) {
    let child_prec = precedence(child);
    let needs_parens = child_prec < parent_prec || (parenthesize_equal && child_prec == parent_prec);
    if needs_parens {
        out.push('(');
        write_expr(out, child);
        out.push(')');
    } else {
        write_expr(out, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn canon(input: &str) -> String {
        render(&parse(input).unwrap())
    }

    #[test]
    fn test_drops_redundant_parens() {
        assert_eq!(canon("1+(2*3)"), "1+2*3");
        assert_eq!(canon("((1))+((2))"), "1+2");
    }

    #[test]
    fn test_keeps_required_parens() {
        assert_eq!(canon("(1+2)*3"), "(1+2)*3");
        assert_eq!(canon("1/(2*3)"), "1/(2*3)");
        assert_eq!(canon("8-(2-1)"), "8-(2-1)");
        assert_eq!(canon("-(1+2)"), "-(1+2)");
    }

    #[test]
    fn test_left_equal_precedence_unparenthesized() {
        assert_eq!(canon("(8-2)-1"), "8-2-1");
        assert_eq!(canon("(8/2)/2"), "8/2/2");
    }

    #[test]
    fn test_uppercases_refs_and_strips_spaces() {
        assert_eq!(canon(" a1 + bb2 "), "A1+BB2");
    }

    #[test]
    fn test_unary_inside_product() {
        assert_eq!(canon("-1*2"), "-1*2");
        assert_eq!(canon("2*-1"), "2*-1");
    }
}
