//! Formula evaluation against a sheet view.
//!
//! Every fault is an error *value*, never an `Err`: the first error met
//! (left to right) becomes the result. Operand coercion follows the cell
//! rules: absent or empty cells read as 0, numeric text converts under
//! the strict grammar, anything else is a value error.

use tabula_core::{parse_strict_number, CellError, Position, SheetView, Value};

use crate::parser::{Expr, Op, UnaryOp};

/// Evaluate an expression. Returns a number, or the first error value.
pub fn evaluate(expr: &Expr, sheet: &dyn SheetView) -> Value {
    match eval_number(expr, sheet) {
        Ok(n) => Value::Number(n),
        Err(e) => Value::Error(e),
    }
}

fn eval_number(expr: &Expr, sheet: &dyn SheetView) -> Result<f64, CellError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ref(pos) => ref_number(*pos, sheet),
        Expr::Unary { op, operand } => {
            let n = eval_number(operand, sheet)?;
            Ok(match op {
                UnaryOp::Plus => n,
                UnaryOp::Minus => -n,
            })
        }
        Expr::Binary { op, left, right } => {
            let lhs = eval_number(left, sheet)?;
            let rhs = eval_number(right, sheet)?;
            match op {
                Op::Add => Ok(lhs + rhs),
                Op::Sub => Ok(lhs - rhs),
                Op::Mul => Ok(lhs * rhs),
                Op::Div => {
                    if rhs == 0.0 {
                        Err(CellError::DivZero)
                    } else {
                        Ok(lhs / rhs)
                    }
                }
            }
        }
    }
}

/// Read a referenced cell as a number.
fn ref_number(pos: Position, sheet: &dyn SheetView) -> Result<f64, CellError> {
    if !pos.is_valid() {
        return Err(CellError::Ref);
    }
    match sheet.cell_value(pos) {
        None => Ok(0.0),
        Some(Value::Number(n)) => Ok(n),
        Some(Value::Text(s)) => {
            if s.is_empty() {
                Ok(0.0)
            } else {
                parse_strict_number(&s).ok_or(CellError::Value)
            }
        }
        Some(Value::Error(e)) => Err(e),
    }
}
