//! Calculator skill: evaluates arithmetic found in an utterance.
//!
//! The utterance is reduced to the characters `0-9 + - * / ( ) .` and
//! whitespace, then parsed by a small recursive-descent evaluator that
//! knows only those operators, unary minus, and decimal literals.

use async_trait::async_trait;
use parley_core::skill::{Capability, Skill};
use tracing::{debug, error};

pub const NO_EXPRESSION: &str = "I couldn't find a valid mathematical expression in your request.";
pub const CALCULATION_FAILED: &str = "Sorry, I couldn't perform that calculation.";

/// Parentheses / unary-minus nesting limit.
const MAX_DEPTH: usize = 64;

pub struct CalculatorSkill;

#[async_trait]
impl Skill for CalculatorSkill {
    fn capability(&self) -> Capability {
        Capability::Calculation
    }

    async fn handle(&self, utterance: &str) -> String {
        let Some(expr) = extract_expression(utterance) else {
            return NO_EXPRESSION.into();
        };

        match evaluate(&expr) {
            Ok(value) => {
                debug!(expression = %expr, value, "Calculated");
                format!("The result is: {}", format_number(value))
            }
            Err(e) => {
                error!(expression = %expr, "Calculation error: {e}");
                CALCULATION_FAILED.into()
            }
        }
    }
}

/// Keep only arithmetic characters; `None` when nothing is left.
pub fn extract_expression(utterance: &str) -> Option<String> {
    let kept: String = utterance
        .chars()
        .filter(|c| c.is_ascii_digit() || "+-*/().".contains(*c) || c.is_whitespace())
        .collect();
    let trimmed = kept.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Format nicely: drop the trailing `.0` for integral values.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Why an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("Unexpected character: '{0}'")]
    UnexpectedChar(char),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Expected closing parenthesis")]
    UnclosedParen,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Expression nested deeper than {MAX_DEPTH} levels")]
    TooDeep,

    #[error("Result is not a finite number")]
    NonFinite,
}

// ── Recursive-descent expression evaluator ────────────────────────────────

/// Evaluate an arithmetic expression string.
pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser::new(&tokens);
    let result = parser.parse_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(CalcError::UnexpectedToken(format!("{tok:?}")));
    }
    if !result.is_finite() {
        return Err(CalcError::NonFinite);
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' => { tokens.push(Token::Minus); i += 1; }
            '*' => { tokens.push(Token::Star); i += 1; }
            '/' => { tokens.push(Token::Slash); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let num_str: String = chars[start..i].iter().collect();
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| CalcError::InvalidNumber(num_str.clone()))?;
                tokens.push(Token::Number(num));
            }
            c => return Err(CalcError::UnexpectedChar(c)),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<f64, CalcError> {
        let mut left = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.consume();
                    left += self.parse_term()?;
                }
                Token::Minus => {
                    self.consume();
                    left -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // term = unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<f64, CalcError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.consume();
                    left *= self.parse_unary()?;
                }
                Token::Slash => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    left /= right;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // unary = ('-' | '+') unary | primary
    fn parse_unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                self.descend()?;
                let val = self.parse_unary()?;
                self.depth -= 1;
                Ok(-val)
            }
            Some(Token::Plus) => {
                self.consume();
                self.descend()?;
                let val = self.parse_unary()?;
                self.depth -= 1;
                Ok(val)
            }
            _ => self.parse_primary(),
        }
    }

    // primary = NUMBER | '(' expr ')'
    fn parse_primary(&mut self) -> Result<f64, CalcError> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::LParen) => {
                self.descend()?;
                let val = self.parse_expr()?;
                self.depth -= 1;
                match self.consume() {
                    Some(Token::RParen) => Ok(val),
                    _ => Err(CalcError::UnclosedParen),
                }
            }
            Some(tok) => Err(CalcError::UnexpectedToken(format!("{tok:?}"))),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
