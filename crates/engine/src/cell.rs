//! Cell content and the per-cell value cache.
//!
//! Content is one of {Empty, Text, Formula}, resolved from raw input by a
//! fixed precedence. The cache is a single-writer memo slot: reads may
//! populate it through a shared reference (the engine is single-threaded),
//! and only the owning sheet's mutation path clears it.

use std::cell::RefCell;

use tabula_core::{parse_strict_number, Position, SheetView, Value};
use tabula_formula::{Formula, ParseError};

/// Marks raw input as a formula when it is the first character.
pub const FORMULA_SIGIL: char = '=';

/// A leading apostrophe escapes the sigil: kept in the text, stripped
/// from the value.
pub const ESCAPE_PREFIX: char = '\'';

/// What a cell holds.
#[derive(Clone, Debug, Default)]
pub enum Content {
    #[default]
    Empty,
    Text(String),
    Formula(Formula),
}

impl Content {
    /// Resolve raw input. Empty input is Empty; anything longer than one
    /// character starting with `=` must parse as a formula (failure
    /// propagates and the caller commits nothing); everything else,
    /// including a bare `"="`, is literal text.
    pub fn from_input(input: &str) -> Result<Content, ParseError> {
        if input.is_empty() {
            Ok(Content::Empty)
        } else if input.len() > 1 && input.starts_with(FORMULA_SIGIL) {
            Ok(Content::Formula(Formula::parse(&input[1..])?))
        } else {
            Ok(Content::Text(input.to_string()))
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Content::Empty)
    }

    /// Positions a formula reads; empty for Empty/Text. Sorted and
    /// deduplicated, and may include references beyond the grid.
    pub fn referenced_cells(&self) -> &[Position] {
        match self {
            Content::Formula(formula) => formula.referenced_cells(),
            Content::Empty | Content::Text(_) => &[],
        }
    }
}

/// One grid cell: content plus the memoized last-computed value.
#[derive(Debug, Default)]
pub struct Cell {
    content: Content,
    cache: RefCell<Option<Value>>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn referenced_cells(&self) -> &[Position] {
        self.content.referenced_cells()
    }

    /// The cell's computed value, memoized.
    ///
    /// Empty reads as the empty value. Text reads as the
    /// apostrophe-stripped literal, coerced to a number when it matches
    /// the strict numeric grammar (and cached in that case). Formulas
    /// evaluate against the sheet; results cache unless they are error
    /// values, which recompute every read.
    pub fn value(&self, sheet: &dyn SheetView) -> Value {
        if let Some(cached) = self.cache.borrow().clone() {
            return cached;
        }

        let (value, cacheable) = match &self.content {
            Content::Empty => (Value::empty(), false),
            Content::Text(text) => {
                let literal = text.strip_prefix(ESCAPE_PREFIX).unwrap_or(text);
                match parse_strict_number(literal) {
                    Some(n) => (Value::Number(n), true),
                    None => (Value::Text(literal.to_string()), false),
                }
            }
            Content::Formula(formula) => {
                let value = formula.evaluate(sheet);
                let cacheable = !value.is_error();
                (value, cacheable)
            }
        };

        if cacheable {
            *self.cache.borrow_mut() = Some(value.clone());
        }
        value
    }

    /// The cell's textual form: `""` for Empty, the literal (apostrophe
    /// included) for Text, the sigil plus canonical rendering for
    /// formulas.
    pub fn text(&self) -> String {
        match &self.content {
            Content::Empty => String::new(),
            Content::Text(text) => text.clone(),
            Content::Formula(formula) => format!("{}{}", FORMULA_SIGIL, formula.canonical_text()),
        }
    }

    pub fn has_cache(&self) -> bool {
        self.cache.borrow().is_some()
    }

    /// Clear the cache, reporting whether a value was present. The
    /// invalidation cascade stops recursing where this returns false.
    pub(crate) fn take_cache(&self) -> bool {
        self.cache.borrow_mut().take().is_some()
    }

    /// Swap content in. The cache is dropped with the old content; the
    /// sheet runs the dependent cascade immediately after.
    pub(crate) fn replace_content(&mut self, content: Content) {
        self.content = content;
        *self.cache.get_mut() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoCells;

    impl SheetView for NoCells {
        fn cell_value(&self, _pos: Position) -> Option<Value> {
            None
        }
    }

    #[test]
    fn test_input_precedence() {
        assert!(matches!(Content::from_input("").unwrap(), Content::Empty));
        assert!(matches!(Content::from_input("=1+2").unwrap(), Content::Formula(_)));
        assert!(matches!(Content::from_input("hello").unwrap(), Content::Text(_)));
        // A bare sigil is text, not a formula
        assert!(matches!(Content::from_input("=").unwrap(), Content::Text(_)));
    }

    #[test]
    fn test_parse_failure_propagates() {
        assert!(Content::from_input("=1+").is_err());
        assert!(Content::from_input("=)(").is_err());
    }

    #[test]
    fn test_empty_value_and_text() {
        let cell = Cell::new();
        assert_eq!(cell.value(&NoCells), Value::empty());
        assert_eq!(cell.text(), "");
        assert!(!cell.has_cache());
    }

    #[test]
    fn test_text_numeric_coercion_caches() {
        let mut cell = Cell::new();
        cell.replace_content(Content::from_input("12.5").unwrap());
        assert_eq!(cell.value(&NoCells), Value::Number(12.5));
        assert!(cell.has_cache());
    }

    #[test]
    fn test_plain_text_not_cached() {
        let mut cell = Cell::new();
        cell.replace_content(Content::from_input("widgets").unwrap());
        assert_eq!(cell.value(&NoCells), Value::Text("widgets".to_string()));
        assert!(!cell.has_cache());
    }

    #[test]
    fn test_apostrophe_escape() {
        let mut cell = Cell::new();
        cell.replace_content(Content::from_input("'=5").unwrap());
        assert_eq!(cell.text(), "'=5");
        assert_eq!(cell.value(&NoCells), Value::Text("=5".to_string()));
    }

    #[test]
    fn test_formula_text_is_canonical() {
        let mut cell = Cell::new();
        cell.replace_content(Content::from_input("= 1 + (2*3) ").unwrap());
        assert_eq!(cell.text(), "=1+2*3");
    }

    #[test]
    fn test_error_results_recompute() {
        let mut cell = Cell::new();
        cell.replace_content(Content::from_input("=1/0").unwrap());
        assert!(cell.value(&NoCells).is_error());
        assert!(!cell.has_cache());
    }

    #[test]
    fn test_take_cache_is_idempotent() {
        let mut cell = Cell::new();
        cell.replace_content(Content::from_input("42").unwrap());
        let _ = cell.value(&NoCells);
        assert!(cell.take_cache());
        assert!(!cell.take_cache());
    }
}
