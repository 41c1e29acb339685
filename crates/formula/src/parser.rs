// Formula parser - converts expression text into an AST.
// Supports: numbers, cell refs (A1), unary +/-, basic math (+, -, *, /), parens.

use thiserror::Error;

use tabula_core::Position;

/// Expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Cell reference. May lie beyond the addressable grid; the evaluator
    /// turns those into a reference error.
    Ref(Position),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

/// Failure to parse expression text. Raised at edit time; the sheet is
/// left untouched when this surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("malformed number '{0}'")]
    MalformedNumber(String),
    #[error("malformed cell reference '{0}'")]
    MalformedReference(String),
    #[error("unexpected '{0}'")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unbalanced parenthesis")]
    UnbalancedParen,
}

/// Parse expression text (sigil already stripped) into an AST.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::RParen) => Err(ParseError::UnbalancedParen),
        Some(tok) => Err(ParseError::UnexpectedToken(tok.describe())),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    CellRef(Position),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::CellRef(pos) => pos.to_string(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => { chars.next(); }
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            '0'..='9' | '.' => {
                tokens.push(lex_number(&mut chars)?);
            }
            'A'..='Z' | 'a'..='z' => {
                tokens.push(lex_cell_ref(&mut chars)?);
            }
            other => return Err(ParseError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

fn lex_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Token, ParseError> {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() || c == '.' {
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }
    // Optional exponent, consumed only when a digit actually follows:
    // `2e3` lexes as one literal, `2e` leaves the `e` to the reference
    // lexer.
    if let Some(&e) = chars.peek() {
        if e == 'e' || e == 'E' {
            let mut lookahead = chars.clone();
            lookahead.next();
            let mut exp = String::from(e);
            if let Some(&sign) = lookahead.peek() {
                if sign == '+' || sign == '-' {
                    exp.push(sign);
                    lookahead.next();
                }
            }
            if matches!(lookahead.peek(), Some(d) if d.is_ascii_digit()) {
                while let Some(&d) = lookahead.peek() {
                    if d.is_ascii_digit() {
                        exp.push(d);
                        lookahead.next();
                    } else {
                        break;
                    }
                }
                text.push_str(&exp);
                *chars = lookahead;
            }
        }
    }

    if text == "." {
        return Err(ParseError::MalformedNumber(text));
    }
    text.parse::<f64>()
        .map(Token::Number)
        .map_err(|_| ParseError::MalformedNumber(text))
}

fn lex_cell_ref(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Token, ParseError> {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() {
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }
    Position::from_a1(&text)
        .map(Token::CellRef)
        .ok_or(ParseError::MalformedReference(text))
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr := term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(Op::Add),
            Some(Token::Minus) => Some(Op::Sub),
            _ => None,
        } {
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // term := factor (('*' | '/') factor)*
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(Op::Mul),
            Some(Token::Slash) => Some(Op::Div),
            _ => None,
        } {
            self.pos += 1;
            let right = self.parse_factor()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // factor := ('+' | '-') factor | primary
    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                Ok(Expr::Unary {
                    op: UnaryOp::Plus,
                    operand: Box::new(self.parse_factor()?),
                })
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Unary {
                    op: UnaryOp::Minus,
                    operand: Box::new(self.parse_factor()?),
                })
            }
            _ => self.parse_primary(),
        }
    }

    // primary := number | cellref | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.bump() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::CellRef(pos)) => Ok(Expr::Ref(pos)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    Some(tok) => Err(ParseError::UnexpectedToken(tok.describe())),
                    None => Err(ParseError::UnbalancedParen),
                }
            }
            Some(tok) => Err(ParseError::UnexpectedToken(tok.describe())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}
