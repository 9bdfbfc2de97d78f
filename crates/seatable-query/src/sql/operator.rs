//! Per-column-type operator table.
//!
//! Every filterable column type maps to one [`OperatorKind`]. Each kind
//! carries the set of predicates it supports and compiles a clause into a
//! SQL fragment. Formula columns delegate to the kind of their declared
//! result type.

use chrono::NaiveDate;
use serde_json::Value;

use super::spec::{FilterClause, FilterPredicate};
use crate::column::{Column, ColumnKind, FormulaResultType};
use crate::date::{days_after, days_before, exact_date, DateModifier, DateResolver, RelativeDate};
use crate::error::{QueryError, QueryResult};

use super::spec::FilterPredicate::*;

const TEXT_PREDICATES: &[FilterPredicate] =
    &[Contains, DoesNotContain, Is, IsNot, IsEmpty, IsNotEmpty];

const NUMBER_PREDICATES: &[FilterPredicate] = &[
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    IsEmpty,
    IsNotEmpty,
];

const SINGLE_SELECT_PREDICATES: &[FilterPredicate] =
    &[IsAnyOf, IsNoneOf, Is, IsNot, IsEmpty, IsNotEmpty];

const MULTIPLE_SELECT_PREDICATES: &[FilterPredicate] =
    &[HasAnyOf, HasNoneOf, HasAllOf, IsExactly, IsEmpty, IsNotEmpty];

const DATE_PREDICATES: &[FilterPredicate] = &[
    Is,
    IsNot,
    IsAfter,
    IsBefore,
    IsOnOrBefore,
    IsOnOrAfter,
    IsEmpty,
    IsNotEmpty,
    IsWithin,
];

const CHECKBOX_PREDICATES: &[FilterPredicate] = &[Is];

const CREATOR_PREDICATES: &[FilterPredicate] = &[Contains, DoesNotContain, Is, IsNot];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The operator family a column compiles with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Text,
    Number,
    SingleSelect,
    MultipleSelect,
    Date,
    CheckBox,
    Creator,
}

impl OperatorKind {
    /// Selects the operator for a column.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnsupportedColumnType` for types that cannot be
    /// filtered in SQL (long-text, attachments, buttons and `default`).
    pub fn for_column(column: &Column) -> QueryResult<Self> {
        let kind = match column.kind {
            ColumnKind::Text
            | ColumnKind::Url
            | ColumnKind::AutoNumber
            | ColumnKind::Email
            | ColumnKind::Geolocation => OperatorKind::Text,
            ColumnKind::Duration | ColumnKind::Number | ColumnKind::Rate => OperatorKind::Number,
            ColumnKind::Checkbox => OperatorKind::CheckBox,
            ColumnKind::Date | ColumnKind::Ctime | ColumnKind::Mtime => OperatorKind::Date,
            ColumnKind::SingleSelect => OperatorKind::SingleSelect,
            ColumnKind::MultipleSelect | ColumnKind::Collaborator | ColumnKind::Link => {
                OperatorKind::MultipleSelect
            }
            ColumnKind::Creator | ColumnKind::LastModifier => OperatorKind::Creator,
            ColumnKind::Formula | ColumnKind::LinkFormula => match column.result_type() {
                Some(FormulaResultType::Number) => OperatorKind::Number,
                Some(FormulaResultType::Date) => OperatorKind::Date,
                Some(FormulaResultType::Bool) => OperatorKind::CheckBox,
                _ => OperatorKind::Text,
            },
            ColumnKind::Default
            | ColumnKind::LongText
            | ColumnKind::Image
            | ColumnKind::File
            | ColumnKind::Button => {
                return Err(QueryError::UnsupportedColumnType {
                    column_type: column.kind,
                })
            }
        };
        Ok(kind)
    }

    /// Returns the predicates this operator accepts.
    pub fn supported_predicates(&self) -> &'static [FilterPredicate] {
        match self {
            OperatorKind::Text => TEXT_PREDICATES,
            OperatorKind::Number => NUMBER_PREDICATES,
            OperatorKind::SingleSelect => SINGLE_SELECT_PREDICATES,
            OperatorKind::MultipleSelect => MULTIPLE_SELECT_PREDICATES,
            OperatorKind::Date => DATE_PREDICATES,
            OperatorKind::CheckBox => CHECKBOX_PREDICATES,
            OperatorKind::Creator => CREATOR_PREDICATES,
        }
    }

    /// Returns true if the operator accepts `predicate`.
    pub fn supports(&self, predicate: FilterPredicate) -> bool {
        self.supported_predicates().contains(&predicate)
    }
}

/// A column bound to its operator, ready to compile clauses.
#[derive(Debug)]
pub struct Operator<'a> {
    column: &'a Column,
    kind: OperatorKind,
    resolver: DateResolver,
}

impl<'a> Operator<'a> {
    /// Binds the operator for `column`.
    ///
    /// # Errors
    ///
    /// See [`OperatorKind::for_column`].
    pub fn new(column: &'a Column, resolver: DateResolver) -> QueryResult<Self> {
        Ok(Self {
            column,
            kind: OperatorKind::for_column(column)?,
            resolver,
        })
    }

    /// Returns the operator family.
    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// Compiles one clause into a SQL fragment.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnsupportedPredicate` naming the valid set when
    /// the predicate is not defined for this column, and coercion or date
    /// errors when the term does not fit the predicate.
    pub fn compile(&self, clause: &FilterClause) -> QueryResult<String> {
        let predicate = clause.filter_predicate;
        if !self.kind.supports(predicate) {
            return Err(QueryError::UnsupportedPredicate {
                column_type: self.column.kind,
                predicate,
                supported: self.kind.supported_predicates().to_vec(),
            });
        }

        let col = self.column.name.as_str();
        let term = &clause.filter_term;

        match predicate {
            IsEmpty => return Ok(format!("{col} is null")),
            IsNotEmpty => return Ok(format!("{col} is not null")),
            _ => {}
        }

        let fragment = match self.kind {
            OperatorKind::Text => match predicate {
                Is => format!("{col} = {}", quoted(term)),
                IsNot => format!("{col} <> {}", quoted(term)),
                Contains => format!("{col} like '%{}%'", escape(&term_text(term))),
                _ => format!("{col} not like '%{}%'", escape(&term_text(term))),
            },
            OperatorKind::Number => {
                let value = self.number(term)?;
                let op = match predicate {
                    Equal => "=",
                    NotEqual => "<>",
                    Greater => ">",
                    GreaterOrEqual => ">=",
                    Less => "<",
                    _ => "<=",
                };
                format!("{col} {op} {value}")
            }
            OperatorKind::SingleSelect => match predicate {
                Is => format!("{col} = {}", quoted(term)),
                IsNot => format!("{col} <> {}", quoted(term)),
                IsAnyOf => format!("{col} in ({})", self.option_list(term)?),
                _ => format!("{col} not in ({})", self.option_list(term)?),
            },
            OperatorKind::MultipleSelect => {
                let options = self.option_list(term)?;
                match predicate {
                    HasAnyOf => format!("{col} in ({options})"),
                    HasAllOf => format!("{col} has all of ({options})"),
                    HasNoneOf => format!("{col} has none of ({options})"),
                    _ => format!("{col} is exactly ({options})"),
                }
            }
            OperatorKind::Date => self.date(col, clause)?,
            OperatorKind::CheckBox => format!("{col} = {}", self.boolean(term)?),
            OperatorKind::Creator => match predicate {
                Is => format!("{col} = {}", quoted(term)),
                IsNot => format!("{col} <> {}", quoted(term)),
                Contains => format!("{col} in ({})", self.option_list(term)?),
                _ => self
                    .options(term)?
                    .iter()
                    .map(|id| format!("{col} != '{}'", escape(id)))
                    .collect::<Vec<_>>()
                    .join(" and "),
            },
        };
        Ok(fragment)
    }

    fn number(&self, term: &Value) -> QueryResult<String> {
        match term {
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) if is_finite_number(s) => Ok(s.trim().to_string()),
            other => Err(QueryError::value_coercion(
                self.column.kind,
                term_text(other),
                "a number",
            )),
        }
    }

    fn boolean(&self, term: &Value) -> QueryResult<&'static str> {
        let value = match term {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        };
        match value {
            Some(true) => Ok("True"),
            Some(false) => Ok("False"),
            None => Err(QueryError::value_coercion(
                self.column.kind,
                term_text(term),
                "true or false",
            )),
        }
    }

    fn options(&self, term: &Value) -> QueryResult<Vec<String>> {
        let options = term_list(term);
        if options.is_empty() {
            return Err(QueryError::value_coercion(
                self.column.kind,
                term_text(term),
                "a non-empty list of options",
            ));
        }
        Ok(options)
    }

    fn option_list(&self, term: &Value) -> QueryResult<String> {
        Ok(self
            .options(term)?
            .iter()
            .map(|o| format!("'{}'", escape(o)))
            .collect::<Vec<_>>()
            .join(", "))
    }

    fn date(&self, col: &str, clause: &FilterClause) -> QueryResult<String> {
        let resolved = self.resolve_date(clause)?;

        if clause.filter_predicate == IsWithin {
            let RelativeDate::Range(start, end) = resolved else {
                return Err(QueryError::invalid_date_term(
                    clause.modifier().unwrap_or_default(),
                    "is_within needs a modifier that resolves to a date range",
                ));
            };
            return Ok(format!(
                "{col} >= '{}' and {col} < '{}'",
                day(start),
                day(end)
            ));
        }

        let RelativeDate::Day(target) = resolved else {
            return Err(QueryError::invalid_date_term(
                clause.modifier().unwrap_or_default(),
                format!(
                    "{} needs a modifier that resolves to a single date",
                    clause.filter_predicate
                ),
            ));
        };

        let fragment = match clause.filter_predicate {
            Is => format!(
                "{col} >= '{}' and {col} < '{}'",
                day(target),
                day(days_after(target, 1)?)
            ),
            IsBefore => format!("{col} < '{}' and {col} is not null", day(target)),
            IsAfter => format!("{col} > '{}'", day(target)),
            IsOnOrBefore => format!("{col} <= '{}' and {col} is not null", day(target)),
            IsOnOrAfter => format!("{col} >= '{}' and {col} is not null", day(target)),
            _ => format!(
                "({col} >= '{}' or {col} <= '{}') and {col} is not null",
                day(days_after(target, 1)?),
                day(days_before(target, 1)?)
            ),
        };
        Ok(fragment)
    }

    fn resolve_date(&self, clause: &FilterClause) -> QueryResult<RelativeDate> {
        let term = term_text(&clause.filter_term);
        match clause.modifier() {
            Some(modifier) => self.resolver.resolve(modifier.parse()?, &term),
            None if exact_date(&term).is_ok() => {
                self.resolver.resolve(DateModifier::ExactDate, &term)
            }
            None => Err(QueryError::invalid_date_term(
                term,
                "expected a filter term modifier or a date as YYYY-MM-DD",
            )),
        }
    }
}

fn day(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn is_finite_number(text: &str) -> bool {
    text.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

fn escape(text: &str) -> String {
    text.replace('\'', "''")
}

fn quoted(term: &Value) -> String {
    format!("'{}'", escape(&term_text(term)))
}

/// Renders a scalar term the way it appears inside a fragment.
fn term_text(term: &Value) -> String {
    match term {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Treats a scalar term as a one-element list.
fn term_list(term: &Value) -> Vec<String> {
    match term {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(term_text).collect(),
        scalar => vec![term_text(scalar)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnData;
    use serde_json::json;

    fn today() -> DateResolver {
        DateResolver::new(NaiveDate::from_ymd_opt(2021, 12, 6).unwrap())
    }

    fn compile(kind: ColumnKind, predicate: FilterPredicate, term: Value) -> QueryResult<String> {
        let column = Column::new("k", "col", kind);
        Operator::new(&column, today())?.compile(&FilterClause::by_name("col", predicate, term))
    }

    fn formula(result_type: FormulaResultType) -> Column {
        Column::new("f", "F", ColumnKind::Formula).with_data(ColumnData {
            result_type: Some(result_type),
            ..ColumnData::default()
        })
    }

    #[test]
    fn test_operator_mapping() {
        let cases = [
            (ColumnKind::Url, OperatorKind::Text),
            (ColumnKind::Rate, OperatorKind::Number),
            (ColumnKind::Mtime, OperatorKind::Date),
            (ColumnKind::Link, OperatorKind::MultipleSelect),
            (ColumnKind::LastModifier, OperatorKind::Creator),
            (ColumnKind::Checkbox, OperatorKind::CheckBox),
        ];
        for (kind, expected) in cases {
            let column = Column::new("k", "c", kind);
            assert_eq!(OperatorKind::for_column(&column).unwrap(), expected);
        }
    }

    #[test]
    fn test_formula_delegates_by_result_type() {
        assert_eq!(
            OperatorKind::for_column(&formula(FormulaResultType::Number)).unwrap(),
            OperatorKind::Number
        );
        assert_eq!(
            OperatorKind::for_column(&formula(FormulaResultType::Bool)).unwrap(),
            OperatorKind::CheckBox
        );
        assert_eq!(
            OperatorKind::for_column(&formula(FormulaResultType::Array)).unwrap(),
            OperatorKind::Text
        );
        let bare = Column::new("f", "F", ColumnKind::LinkFormula);
        assert_eq!(OperatorKind::for_column(&bare).unwrap(), OperatorKind::Text);
    }

    #[test]
    fn test_unsupported_column_type() {
        let column = Column::new("k", "Notes", ColumnKind::LongText);
        assert_eq!(
            OperatorKind::for_column(&column).unwrap_err(),
            QueryError::UnsupportedColumnType {
                column_type: ColumnKind::LongText
            }
        );
    }

    #[test]
    fn test_text_fragments() {
        assert_eq!(compile(ColumnKind::Text, Is, json!("LINK")).unwrap(), "col = 'LINK'");
        assert_eq!(compile(ColumnKind::Text, IsNot, json!("a")).unwrap(), "col <> 'a'");
        assert_eq!(compile(ColumnKind::Email, Contains, json!("x")).unwrap(), "col like '%x%'");
        assert_eq!(
            compile(ColumnKind::Text, DoesNotContain, json!("x")).unwrap(),
            "col not like '%x%'"
        );
        assert_eq!(compile(ColumnKind::Text, IsEmpty, Value::Null).unwrap(), "col is null");
        assert_eq!(
            compile(ColumnKind::Text, IsNotEmpty, Value::Null).unwrap(),
            "col is not null"
        );
    }

    #[test]
    fn test_quotes_are_doubled() {
        assert_eq!(compile(ColumnKind::Text, Is, json!("it's")).unwrap(), "col = 'it''s'");
    }

    #[test]
    fn test_number_fragments_are_unquoted() {
        assert_eq!(compile(ColumnKind::Number, Greater, json!(4)).unwrap(), "col > 4");
        assert_eq!(compile(ColumnKind::Number, LessOrEqual, json!("2.5")).unwrap(), "col <= 2.5");
        assert_eq!(compile(ColumnKind::Duration, NotEqual, json!(60)).unwrap(), "col <> 60");
        assert!(matches!(
            compile(ColumnKind::Number, Equal, json!("four")),
            Err(QueryError::ValueCoercion { .. })
        ));
    }

    #[test]
    fn test_non_finite_number_terms_rejected() {
        for term in ["inf", "-inf", "infinity", "NaN", "nan", " +Infinity "] {
            assert!(
                matches!(
                    compile(ColumnKind::Number, Greater, json!(term)),
                    Err(QueryError::ValueCoercion { .. })
                ),
                "{term}"
            );
        }
        assert_eq!(compile(ColumnKind::Number, Less, json!(" -1e3 ")).unwrap(), "col < -1e3");
    }

    #[test]
    fn test_single_select_fragments() {
        assert_eq!(
            compile(ColumnKind::SingleSelect, IsAnyOf, json!(["a", "b"])).unwrap(),
            "col in ('a', 'b')"
        );
        assert_eq!(
            compile(ColumnKind::SingleSelect, IsNoneOf, json!("a")).unwrap(),
            "col not in ('a')"
        );
        assert_eq!(compile(ColumnKind::SingleSelect, Is, json!("a")).unwrap(), "col = 'a'");
    }

    #[test]
    fn test_multiple_select_fragments() {
        let term = json!(["aa", "bb", "cc"]);
        assert_eq!(
            compile(ColumnKind::MultipleSelect, HasNoneOf, term.clone()).unwrap(),
            "col has none of ('aa', 'bb', 'cc')"
        );
        assert_eq!(
            compile(ColumnKind::Collaborator, HasAnyOf, term.clone()).unwrap(),
            "col in ('aa', 'bb', 'cc')"
        );
        assert_eq!(
            compile(ColumnKind::Link, HasAllOf, term.clone()).unwrap(),
            "col has all of ('aa', 'bb', 'cc')"
        );
        assert_eq!(
            compile(ColumnKind::MultipleSelect, IsExactly, term).unwrap(),
            "col is exactly ('aa', 'bb', 'cc')"
        );
        assert_eq!(
            compile(ColumnKind::MultipleSelect, IsEmpty, json!([])).unwrap(),
            "col is null"
        );
        assert!(compile(ColumnKind::MultipleSelect, HasAnyOf, json!([])).is_err());
    }

    #[test]
    fn test_date_fragments() {
        let column = Column::new("k", "d", ColumnKind::Date);
        let op = Operator::new(&column, today()).unwrap();
        let clause = |p, term: &str, modifier: &str| {
            op.compile(&FilterClause::by_name("d", p, term).with_modifier(modifier))
                .unwrap()
        };

        assert_eq!(
            clause(Is, "", "today"),
            "d >= '2021-12-06' and d < '2021-12-07'"
        );
        assert_eq!(
            clause(IsBefore, "31", "number_of_days_ago"),
            "d < '2021-11-05' and d is not null"
        );
        assert_eq!(clause(IsAfter, "", "tomorrow"), "d > '2021-12-07'");
        assert_eq!(
            clause(IsOnOrBefore, "2021-01-31", "exact_date"),
            "d <= '2021-01-31' and d is not null"
        );
        assert_eq!(
            clause(IsOnOrAfter, "", "one_week_ago"),
            "d >= '2021-11-29' and d is not null"
        );
        assert_eq!(
            clause(IsNot, "", "today"),
            "(d >= '2021-12-07' or d <= '2021-12-05') and d is not null"
        );
        assert_eq!(
            clause(IsWithin, "", "this_week"),
            "d >= '2021-12-05' and d < '2021-12-11'"
        );
    }

    #[test]
    fn test_date_without_modifier_uses_exact_date() {
        assert_eq!(
            compile(ColumnKind::Ctime, IsAfter, json!("2021-06-01")).unwrap(),
            "col > '2021-06-01'"
        );
        assert!(matches!(
            compile(ColumnKind::Date, IsAfter, json!("soon")),
            Err(QueryError::InvalidDateTerm { .. })
        ));
    }

    #[test]
    fn test_date_range_and_single_mismatch() {
        let column = Column::new("k", "d", ColumnKind::Date);
        let op = Operator::new(&column, today()).unwrap();
        let is_this_month = FilterClause::by_name("d", Is, "").with_modifier("this_month");
        assert!(matches!(
            op.compile(&is_this_month),
            Err(QueryError::InvalidDateTerm { .. })
        ));
        let within_today = FilterClause::by_name("d", IsWithin, "").with_modifier("today");
        assert!(matches!(
            op.compile(&within_today),
            Err(QueryError::InvalidDateTerm { .. })
        ));
    }

    #[test]
    fn test_checkbox_renders_capitalized_booleans() {
        assert_eq!(compile(ColumnKind::Checkbox, Is, json!(false)).unwrap(), "col = False");
        assert_eq!(compile(ColumnKind::Checkbox, Is, json!("TRUE")).unwrap(), "col = True");
        assert!(compile(ColumnKind::Checkbox, Is, json!("yes")).is_err());
    }

    #[test]
    fn test_creator_fragments() {
        assert_eq!(
            compile(ColumnKind::Creator, Contains, json!(["a@auth.local", "b@auth.local"])).unwrap(),
            "col in ('a@auth.local', 'b@auth.local')"
        );
        assert_eq!(
            compile(ColumnKind::Creator, DoesNotContain, json!(["a@auth.local", "b@auth.local"]))
                .unwrap(),
            "col != 'a@auth.local' and col != 'b@auth.local'"
        );
    }

    #[test]
    fn test_creator_empty_lists_rejected() {
        for predicate in [Contains, DoesNotContain] {
            for term in [json!([]), Value::Null] {
                assert!(
                    matches!(
                        compile(ColumnKind::Creator, predicate, term.clone()),
                        Err(QueryError::ValueCoercion { .. })
                    ),
                    "{predicate} {term}"
                );
            }
        }
    }

    #[test]
    fn test_date_padding_at_calendar_edges() {
        let column = Column::new("k", "col", ColumnKind::Date);
        let operator = Operator::new(&column, DateResolver::new(NaiveDate::MAX)).unwrap();
        for predicate in [Is, IsNot] {
            let clause = FilterClause::by_name("col", predicate, Value::Null).with_modifier("today");
            assert!(
                matches!(operator.compile(&clause), Err(QueryError::InvalidDateTerm { .. })),
                "{predicate}"
            );
        }
        let clause = FilterClause::by_name("col", IsBefore, Value::Null).with_modifier("today");
        assert!(operator.compile(&clause).is_ok());
    }

    #[test]
    fn test_unsupported_predicate_names_valid_set() {
        let err = compile(ColumnKind::SingleSelect, Greater, json!(1)).unwrap_err();
        match err {
            QueryError::UnsupportedPredicate {
                column_type,
                predicate,
                supported,
            } => {
                assert_eq!(column_type, ColumnKind::SingleSelect);
                assert_eq!(predicate, Greater);
                assert_eq!(supported, SINGLE_SELECT_PREDICATES.to_vec());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
