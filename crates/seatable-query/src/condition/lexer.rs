//! Lexer (tokenizer) for textual conditions.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::error::SyntaxError;
use crate::column::CompareOp;

/// A token in a condition expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionToken {
    /// A `'quoted'` literal, quotes removed.
    Quoted(String),

    /// A bare word: no whitespace and none of `= ! < > ( )`.
    Bare(String),

    /// The `AND` keyword (any case).
    And,

    /// The `OR` keyword (any case).
    Or,

    /// A comparison operator, including the `LIKE` keyword.
    Op(CompareOp),

    /// Opening parenthesis `(`. Lexed so that the parser can reject it by name.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,
}

impl fmt::Display for ConditionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionToken::Quoted(s) => write!(f, "'{s}'"),
            ConditionToken::Bare(s) => f.write_str(s),
            ConditionToken::And => f.write_str("AND"),
            ConditionToken::Or => f.write_str("OR"),
            ConditionToken::Op(CompareOp::Like) => f.write_str("LIKE"),
            ConditionToken::Op(op) => f.write_str(op.symbol()),
            ConditionToken::OpenParen => f.write_str("("),
            ConditionToken::CloseParen => f.write_str(")"),
        }
    }
}

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: ConditionToken,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// Lexer for tokenizing condition expressions.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Current byte position in the input string.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.position += ch.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Reads a single-quoted literal. Everything up to the closing quote is kept.
    fn read_quoted_string(&mut self) -> Result<String, SyntaxError> {
        let start = self.position;
        self.next_char();

        let mut result = String::new();
        while let Some(c) = self.next_char() {
            if c == '\'' {
                return Ok(result);
            }
            result.push(c);
        }
        Err(SyntaxError::UnterminatedString { position: start })
    }

    fn read_bare(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.peek() {
            if c.is_whitespace() || is_operator_char(c) {
                break;
            }
            word.push(c);
            self.next_char();
        }
        word
    }

    /// Consumes the next character if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(&expected) {
            self.next_char();
            true
        } else {
            false
        }
    }

    /// Returns the next token with its position, or None at end of input.
    pub fn next_token(&mut self) -> Result<Option<PositionedToken>, SyntaxError> {
        self.skip_whitespace();

        let Some(&c) = self.peek() else {
            return Ok(None);
        };
        let position = self.position;

        let token = match c {
            '\'' => ConditionToken::Quoted(self.read_quoted_string()?),
            '(' => {
                self.next_char();
                ConditionToken::OpenParen
            }
            ')' => {
                self.next_char();
                ConditionToken::CloseParen
            }
            '=' => {
                self.next_char();
                ConditionToken::Op(CompareOp::Equal)
            }
            '!' => {
                self.next_char();
                if !self.eat('=') {
                    return Err(SyntaxError::unexpected_token("!"));
                }
                ConditionToken::Op(CompareOp::Unequal)
            }
            '<' => {
                self.next_char();
                if self.eat('>') {
                    ConditionToken::Op(CompareOp::Unequal)
                } else if self.eat('=') {
                    ConditionToken::Op(CompareOp::LessEqual)
                } else {
                    ConditionToken::Op(CompareOp::LessThan)
                }
            }
            '>' => {
                self.next_char();
                if self.eat('=') {
                    ConditionToken::Op(CompareOp::GreaterEqual)
                } else {
                    ConditionToken::Op(CompareOp::GreaterThan)
                }
            }
            _ => keyword_or_bare(self.read_bare()),
        };

        Ok(Some(PositionedToken { token, position }))
    }

    /// Tokenizes the entire input.
    pub fn tokenize(mut self) -> Result<Vec<PositionedToken>, SyntaxError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>' | '(' | ')')
}

fn keyword_or_bare(word: String) -> ConditionToken {
    if word.eq_ignore_ascii_case("and") {
        ConditionToken::And
    } else if word.eq_ignore_ascii_case("or") {
        ConditionToken::Or
    } else if word.eq_ignore_ascii_case("like") {
        ConditionToken::Op(CompareOp::Like)
    } else {
        ConditionToken::Bare(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<ConditionToken> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_tokenize_simple_comparison() {
        assert_eq!(
            tokens("Name = 'Tom'"),
            vec![
                ConditionToken::Bare("Name".to_string()),
                ConditionToken::Op(CompareOp::Equal),
                ConditionToken::Quoted("Tom".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_operators_without_spaces() {
        assert_eq!(
            tokens("a>=1"),
            vec![
                ConditionToken::Bare("a".to_string()),
                ConditionToken::Op(CompareOp::GreaterEqual),
                ConditionToken::Bare("1".to_string()),
            ]
        );
        assert_eq!(tokens("a<>1")[1], ConditionToken::Op(CompareOp::Unequal));
        assert_eq!(tokens("a!=1")[1], ConditionToken::Op(CompareOp::Unequal));
        assert_eq!(tokens("a<=1")[1], ConditionToken::Op(CompareOp::LessEqual));
        assert_eq!(tokens("a<1")[1], ConditionToken::Op(CompareOp::LessThan));
        assert_eq!(tokens("a>1")[1], ConditionToken::Op(CompareOp::GreaterThan));
    }

    #[test]
    fn test_tokenize_keywords_case_insensitive() {
        assert_eq!(
            tokens("a like 'x%' AnD b = 1 oR c = 2"),
            vec![
                ConditionToken::Bare("a".to_string()),
                ConditionToken::Op(CompareOp::Like),
                ConditionToken::Quoted("x%".to_string()),
                ConditionToken::And,
                ConditionToken::Bare("b".to_string()),
                ConditionToken::Op(CompareOp::Equal),
                ConditionToken::Bare("1".to_string()),
                ConditionToken::Or,
                ConditionToken::Bare("c".to_string()),
                ConditionToken::Op(CompareOp::Equal),
                ConditionToken::Bare("2".to_string()),
            ]
        );
    }

    #[test]
    fn test_keyword_must_match_whole_word() {
        assert_eq!(tokens("android")[0], ConditionToken::Bare("android".to_string()));
        assert_eq!(tokens("likes")[0], ConditionToken::Bare("likes".to_string()));
    }

    #[test]
    fn test_quoted_string_keeps_embedded_characters() {
        assert_eq!(
            tokens("'a = b AND (c)'"),
            vec![ConditionToken::Quoted("a = b AND (c)".to_string())]
        );
        assert_eq!(tokens("''"), vec![ConditionToken::Quoted(String::new())]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("Name = 'Tom").tokenize().unwrap_err();
        assert_eq!(err, SyntaxError::UnterminatedString { position: 7 });
    }

    #[test]
    fn test_lone_bang_is_rejected() {
        let err = Lexer::new("a ! b").tokenize().unwrap_err();
        assert_eq!(err, SyntaxError::unexpected_token("!"));
    }

    #[test]
    fn test_token_positions() {
        let positioned = Lexer::new("ab  = 'c'").tokenize().unwrap();
        let positions: Vec<usize> = positioned.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 4, 6]);
    }

    #[test]
    fn test_parens_are_lexed() {
        assert_eq!(tokens("(a")[0], ConditionToken::OpenParen);
        assert_eq!(tokens("a)")[1], ConditionToken::CloseParen);
    }
}
