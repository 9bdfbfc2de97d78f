//! Column metadata and per-type value semantics.
//!
//! Columns are supplied by the caller (usually fetched from the table
//! metadata endpoint) and are read-only input to both the condition engine
//! and the SQL generator.

mod value;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use value::{CellValue, CompareOp, InputValue};

/// The declared type of a column, using the service's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnKind {
    Default,
    Number,
    Text,
    Checkbox,
    Date,
    SingleSelect,
    LongText,
    Image,
    File,
    MultipleSelect,
    Collaborator,
    Link,
    Formula,
    LinkFormula,
    Creator,
    Ctime,
    LastModifier,
    Mtime,
    Geolocation,
    AutoNumber,
    Url,
    Email,
    Duration,
    Button,
    Rate,
}

/// How cells of a column compare against condition values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFamily {
    /// Scalar strings: `=`, `!=` and `like`.
    Text,
    /// Numbers and timestamps: equality plus ordering.
    Ordered,
    /// Lists of names or descriptors: membership.
    List,
    /// Checkbox truthiness.
    Bool,
}

impl ColumnKind {
    /// Returns the wire name of the column type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Default => "default",
            ColumnKind::Number => "number",
            ColumnKind::Text => "text",
            ColumnKind::Checkbox => "checkbox",
            ColumnKind::Date => "date",
            ColumnKind::SingleSelect => "single-select",
            ColumnKind::LongText => "long-text",
            ColumnKind::Image => "image",
            ColumnKind::File => "file",
            ColumnKind::MultipleSelect => "multiple-select",
            ColumnKind::Collaborator => "collaborator",
            ColumnKind::Link => "link",
            ColumnKind::Formula => "formula",
            ColumnKind::LinkFormula => "link-formula",
            ColumnKind::Creator => "creator",
            ColumnKind::Ctime => "ctime",
            ColumnKind::LastModifier => "last-modifier",
            ColumnKind::Mtime => "mtime",
            ColumnKind::Geolocation => "geolocation",
            ColumnKind::AutoNumber => "auto-number",
            ColumnKind::Url => "url",
            ColumnKind::Email => "email",
            ColumnKind::Duration => "duration",
            ColumnKind::Button => "button",
            ColumnKind::Rate => "rate",
        }
    }

    /// Returns the comparison family used by the condition engine.
    pub fn value_family(&self) -> ValueFamily {
        match self {
            ColumnKind::Number
            | ColumnKind::Date
            | ColumnKind::Ctime
            | ColumnKind::Mtime
            | ColumnKind::Rate
            | ColumnKind::Duration => ValueFamily::Ordered,
            ColumnKind::MultipleSelect | ColumnKind::Collaborator | ColumnKind::Link => {
                ValueFamily::List
            }
            ColumnKind::Checkbox => ValueFamily::Bool,
            ColumnKind::Default
            | ColumnKind::Text
            | ColumnKind::SingleSelect
            | ColumnKind::LongText
            | ColumnKind::Image
            | ColumnKind::File
            | ColumnKind::Formula
            | ColumnKind::LinkFormula
            | ColumnKind::Creator
            | ColumnKind::LastModifier
            | ColumnKind::Geolocation
            | ColumnKind::AutoNumber
            | ColumnKind::Url
            | ColumnKind::Email
            | ColumnKind::Button => ValueFamily::Text,
        }
    }

    /// Returns true for the timestamp columns maintained by the service.
    pub fn is_system_time(&self) -> bool {
        matches!(self, ColumnKind::Ctime | ColumnKind::Mtime)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared result type of a formula column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaResultType {
    Number,
    String,
    Date,
    Bool,
    Array,
}

/// One option of a single- or multiple-select column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Type-specific column configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnData {
    /// Options of a select column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,

    /// Result type of a formula or link-formula column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<FormulaResultType>,

    /// Link id of a link column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,

    /// Table owning a link column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,

    /// Linked table of a link column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_table_id: Option<String>,

    /// Display format of a number, date or duration column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ColumnData {
    /// Finds the name of a select option by id.
    pub fn option_name(&self, option_id: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.id == option_id)
            .map(|o| o.name.as_str())
    }
}

/// One field of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Internal column key (stable across renames).
    #[serde(default)]
    pub key: String,

    /// Display name, unique within the table.
    pub name: String,

    /// Declared column type.
    #[serde(rename = "type")]
    pub kind: ColumnKind,

    /// Type-specific configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ColumnData>,
}

impl Column {
    /// Creates a column without type-specific data.
    pub fn new(key: impl Into<String>, name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            kind,
            data: None,
        }
    }

    /// Attaches type-specific data to the column.
    pub fn with_data(mut self, data: ColumnData) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the formula result type, if this column declares one.
    pub fn result_type(&self) -> Option<FormulaResultType> {
        self.data.as_ref().and_then(|d| d.result_type)
    }

    /// Wraps a raw cell of this column for comparison.
    pub fn cell<'a>(&self, raw: Option<&'a serde_json::Value>) -> CellValue<'a> {
        CellValue::new(self.kind, raw)
    }

    /// Coerces a condition value into this column's native type.
    pub fn parse_input(&self, raw: &str) -> crate::QueryResult<InputValue> {
        InputValue::parse(self.kind, raw)
    }
}
