//! Recursive descent parser for textual conditions.

use super::ast::Condition;
use super::error::SyntaxError;
use super::lexer::{ConditionToken, Lexer, PositionedToken};
use crate::column::CompareOp;

/// Parser for condition expressions.
///
/// # Grammar
///
/// ```text
/// expr    ::= filter (("AND" | "OR") filter)*
/// filter  ::= factor cmp_op factor
/// factor  ::= QUOTED_STRING | BARE_STRING
/// cmp_op  ::= "=" | "!=" | "<>" | ">=" | ">" | "<=" | "<" | "LIKE"
/// ```
///
/// `AND` and `OR` have the same precedence and fold left to right. There is
/// no grouping with parentheses.
///
/// # Example
///
/// ```
/// use seatable_query::condition::{Condition, ConditionParser};
///
/// let condition = ConditionParser::parse("Name = 'Tom' or Age > 18").unwrap();
/// assert!(matches!(condition, Condition::Or(_, _)));
/// ```
pub struct ConditionParser {
    tokens: Vec<PositionedToken>,
    position: usize,
}

impl ConditionParser {
    /// Parses a condition string into a [`Condition`] AST.
    ///
    /// # Errors
    ///
    /// Returns `SyntaxError::EmptyExpression` for a blank input,
    /// `SyntaxError::UnexpectedToken` naming the first token that does not fit
    /// the grammar, and `SyntaxError::UnexpectedEndOfInput` if the input stops
    /// in the middle of a comparison.
    pub fn parse(input: &str) -> Result<Condition, SyntaxError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SyntaxError::EmptyExpression);
        }

        let tokens = Lexer::new(trimmed).tokenize()?;
        let mut parser = Self { tokens, position: 0 };
        let condition = parser.parse_expression()?;

        if let Some(remaining) = parser.peek() {
            return Err(SyntaxError::unexpected_token(remaining.to_string()));
        }

        Ok(condition)
    }

    fn peek(&self) -> Option<&ConditionToken> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<&ConditionToken> {
        let token = self.tokens.get(self.position).map(|t| &t.token);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Parses `filter (("AND" | "OR") filter)*`, folding left.
    fn parse_expression(&mut self) -> Result<Condition, SyntaxError> {
        let mut left = self.parse_filter()?;

        loop {
            match self.peek() {
                Some(ConditionToken::And) => {
                    self.advance();
                    let right = self.parse_filter()?;
                    left = Condition::and(left, right);
                }
                Some(ConditionToken::Or) => {
                    self.advance();
                    let right = self.parse_filter()?;
                    left = Condition::or(left, right);
                }
                _ => return Ok(left),
            }
        }
    }

    /// Parses `factor cmp_op factor`.
    fn parse_filter(&mut self) -> Result<Condition, SyntaxError> {
        let column = self.parse_factor()?;
        let op = self.parse_operator()?;
        let value = self.parse_factor()?;
        Ok(Condition::filter(column, op, value))
    }

    fn parse_factor(&mut self) -> Result<String, SyntaxError> {
        match self.advance() {
            Some(ConditionToken::Quoted(s)) | Some(ConditionToken::Bare(s)) => Ok(s.clone()),
            Some(other) => Err(SyntaxError::unexpected_token(other.to_string())),
            None => Err(SyntaxError::UnexpectedEndOfInput),
        }
    }

    fn parse_operator(&mut self) -> Result<CompareOp, SyntaxError> {
        match self.advance() {
            Some(ConditionToken::Op(op)) => Ok(*op),
            Some(other) => Err(SyntaxError::unexpected_token(other.to_string())),
            None => Err(SyntaxError::UnexpectedEndOfInput),
        }
    }
}
