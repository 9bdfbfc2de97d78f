//! Textual condition parser and evaluator.
//!
//! Conditions filter in-memory rows without any I/O.
//!
//! # Syntax
//!
//! - `column op value`, where `op` is one of `=`, `!=`, `<>`, `>`, `>=`,
//!   `<`, `<=` or `like`
//! - Values and column names are bare words or `'quoted strings'`
//! - `and` / `or` (any case) chain comparisons left to right
//! - `col = ''` matches blank cells (null, empty string, empty list)
//! - `like` accepts `abc%`, `%abc`, `%abc%` and `a%b`
//!
//! # Example
//!
//! ```
//! use seatable_query::column::{Column, ColumnKind};
//! use seatable_query::condition::{ConditionEvaluator, ConditionParser};
//! use seatable_query::Row;
//!
//! let columns = vec![Column::new("0000", "Name", ColumnKind::Text)];
//! let rows = vec![Row::new("r1").with("Name", "Tom"), Row::new("r2").with("Name", "Ann")];
//!
//! let condition = ConditionParser::parse("Name like 'T%'").unwrap();
//! let matched = ConditionEvaluator::new(&condition, &columns)
//!     .filter_rows(&rows)
//!     .unwrap();
//! assert_eq!(matched.len(), 1);
//! assert_eq!(matched[0].id(), "r1");
//! ```

mod ast;
mod error;
mod evaluator;
mod lexer;
mod parser;

pub use ast::{Comparison, Condition};
pub use error::SyntaxError;
pub use evaluator::ConditionEvaluator;
pub use lexer::{ConditionToken, Lexer, PositionedToken};
pub use parser::ConditionParser;
