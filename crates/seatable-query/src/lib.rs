//! Query engine for SeaTable tables.
//!
//! Two independent parts share the column model in [`column`]:
//!
//! - The condition engine ([`condition`], [`queryset`]) parses textual
//!   conditions such as `Name like 'ap%' and Age > 18` and evaluates them
//!   over rows already held in memory.
//! - The SQL compiler ([`sql`]) turns a structured filter specification,
//!   as stored in view settings, into one `SELECT` statement for the
//!   service's SQL endpoint.
//!
//! Neither part performs I/O. Rows and columns come from a
//! [`DataSource`] supplied by the caller.
//!
//! # Example
//!
//! ```
//! use seatable_query::column::{Column, ColumnKind};
//! use seatable_query::source::{MemorySource, Table};
//! use seatable_query::sql::FilterSpecification;
//! use seatable_query::Row;
//!
//! let source = MemorySource::new().with_table(Table::new(
//!     "Table1",
//!     vec![Column::new("0000", "Name", ColumnKind::Text)],
//!     vec![Row::new("r1").with("Name", "LINK")],
//! ));
//!
//! let rows = seatable_query::filter(&source, "Table1", "Name = LINK", None).unwrap();
//! assert_eq!(rows.count(), 1);
//!
//! let spec = FilterSpecification::from_json(
//!     r#"{"filters": [{"column_name": "Name", "filter_predicate": "is", "filter_term": "LINK"}]}"#,
//! )
//! .unwrap();
//! let sql = seatable_query::filter_to_sql(&source, "Table1", &spec, 0, 500).unwrap();
//! assert_eq!(sql, "SELECT * FROM Table1 WHERE Name = 'LINK' LIMIT 0, 500");
//! ```

pub mod column;
pub mod condition;
pub mod date;
pub mod error;
pub mod queryset;
pub mod row;
pub mod source;
pub mod sql;

pub use error::{QueryError, QueryResult};
pub use queryset::{filter, QuerySet};
pub use row::{convert_row, Row, RowPatch, ROW_ID_KEY};
pub use source::{DataSource, MemorySource, Table};
pub use sql::{filter_to_sql, FilterSpecification, SqlGenerator, DEFAULT_LIMIT, DEFAULT_START};
