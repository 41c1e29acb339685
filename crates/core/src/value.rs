//! Cell values and evaluation errors.
//!
//! Reading any cell yields a [`Value`]. Evaluation faults (division by
//! zero, bad reference, bad operand) are carried as ordinary values, not
//! as `Err` - a formula referencing an errored cell sees the error value
//! and propagates it like data.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Evaluation error held by a cell as data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellError {
    /// Division by zero.
    DivZero,
    /// Reference outside the addressable grid.
    Ref,
    /// Operand could not be coerced to a number.
    Value,
}

impl CellError {
    /// The fixed display token for this error kind.
    pub fn token(&self) -> &'static str {
        match self {
            CellError::DivZero => "#DIV/0!",
            CellError::Ref => "#REF!",
            CellError::Value => "#VALUE!",
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The computed content of a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Literal or coerced text. The empty string is the empty value.
    Text(String),
    Number(f64),
    Error(CellError),
}

impl Value {
    pub fn empty() -> Self {
        Value::Text(String::new())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}

/// Parse text as a number under the strict decimal/scientific grammar.
///
/// Accepts `12`, `12.`, `.5`, `-3.25e+10`; rejects anything with stray
/// characters, whitespace, or a lone sign. Non-matching text stays text.
pub fn parse_strict_number(text: &str) -> Option<f64> {
    static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();
    let re = NUMERIC_RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+\.?|[0-9]*\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
            .expect("numeric literal regex must compile")
    });
    if re.is_match(text) {
        text.parse::<f64>().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_tokens() {
        assert_eq!(CellError::DivZero.to_string(), "#DIV/0!");
        assert_eq!(CellError::Ref.to_string(), "#REF!");
        assert_eq!(CellError::Value.to_string(), "#VALUE!");
    }

    #[test]
    fn test_number_display_drops_trailing_zero() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_strict_number_accepts() {
        assert_eq!(parse_strict_number("12"), Some(12.0));
        assert_eq!(parse_strict_number("12."), Some(12.0));
        assert_eq!(parse_strict_number(".5"), Some(0.5));
        assert_eq!(parse_strict_number("-3.25e+2"), Some(-325.0));
        assert_eq!(parse_strict_number("+7E1"), Some(70.0));
    }

    #[test]
    fn test_strict_number_rejects() {
        assert_eq!(parse_strict_number(""), None);
        assert_eq!(parse_strict_number(" 12"), None);
        assert_eq!(parse_strict_number("12x"), None);
        assert_eq!(parse_strict_number("."), None);
        assert_eq!(parse_strict_number("-"), None);
        assert_eq!(parse_strict_number("1e"), None);
        assert_eq!(parse_strict_number("0x10"), None);
    }
}
