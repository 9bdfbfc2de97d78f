//! Relative date resolution for date filter terms.
//!
//! A filter term modifier such as `today`, `number_of_days_ago` or
//! `this_month` resolves, relative to a fixed "today", to either a single date
//! or an inclusive `(start, end)` range.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Named relative-date tokens accepted as `filter_term_modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateModifier {
    Today,
    Tomorrow,
    Yesterday,
    OneWeekAgo,
    OneWeekFromNow,
    OneMonthAgo,
    OneMonthFromNow,
    NumberOfDaysAgo,
    NumberOfDaysFromNow,
    ExactDate,
    ThePastWeek,
    ThePastMonth,
    ThePastYear,
    TheNextWeek,
    TheNextMonth,
    TheNextYear,
    TheNextNumbersOfDays,
    ThePastNumbersOfDays,
    ThisWeek,
    ThisMonth,
    ThisYear,
}

impl DateModifier {
    /// Every modifier, in catalog order.
    pub const ALL: [DateModifier; 21] = [
        DateModifier::Today,
        DateModifier::Tomorrow,
        DateModifier::Yesterday,
        DateModifier::OneWeekAgo,
        DateModifier::OneWeekFromNow,
        DateModifier::OneMonthAgo,
        DateModifier::OneMonthFromNow,
        DateModifier::NumberOfDaysAgo,
        DateModifier::NumberOfDaysFromNow,
        DateModifier::ExactDate,
        DateModifier::ThePastWeek,
        DateModifier::ThePastMonth,
        DateModifier::ThePastYear,
        DateModifier::TheNextWeek,
        DateModifier::TheNextMonth,
        DateModifier::TheNextYear,
        DateModifier::TheNextNumbersOfDays,
        DateModifier::ThePastNumbersOfDays,
        DateModifier::ThisWeek,
        DateModifier::ThisMonth,
        DateModifier::ThisYear,
    ];

    /// Returns the wire name of the modifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            DateModifier::Today => "today",
            DateModifier::Tomorrow => "tomorrow",
            DateModifier::Yesterday => "yesterday",
            DateModifier::OneWeekAgo => "one_week_ago",
            DateModifier::OneWeekFromNow => "one_week_from_now",
            DateModifier::OneMonthAgo => "one_month_ago",
            DateModifier::OneMonthFromNow => "one_month_from_now",
            DateModifier::NumberOfDaysAgo => "number_of_days_ago",
            DateModifier::NumberOfDaysFromNow => "number_of_days_from_now",
            DateModifier::ExactDate => "exact_date",
            DateModifier::ThePastWeek => "the_past_week",
            DateModifier::ThePastMonth => "the_past_month",
            DateModifier::ThePastYear => "the_past_year",
            DateModifier::TheNextWeek => "the_next_week",
            DateModifier::TheNextMonth => "the_next_month",
            DateModifier::TheNextYear => "the_next_year",
            DateModifier::TheNextNumbersOfDays => "the_next_numbers_of_days",
            DateModifier::ThePastNumbersOfDays => "the_past_numbers_of_days",
            DateModifier::ThisWeek => "this_week",
            DateModifier::ThisMonth => "this_month",
            DateModifier::ThisYear => "this_year",
        }
    }
}

impl fmt::Display for DateModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateModifier {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateModifier::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| QueryError::invalid_date_term(s, "unknown filter term modifier"))
    }
}

/// The result of resolving a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDate {
    /// A single day.
    Day(NaiveDate),
    /// An inclusive range of days.
    Range(NaiveDate, NaiveDate),
}

/// Resolves modifiers relative to a fixed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResolver {
    today: NaiveDate,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl DateResolver {
    /// Creates a resolver anchored on `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Returns the anchor day.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Resolves a modifier and its term.
    ///
    /// The term is only read by the `number_of_days_*`, `the_*_numbers_of_days`
    /// and `exact_date` modifiers.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidDateTerm` when the term is not a day count
    /// or not a `YYYY-MM-DD` date where one is required.
    pub fn resolve(&self, modifier: DateModifier, term: &str) -> QueryResult<RelativeDate> {
        let today = self.today;
        // Sunday-based week: Monday = 2 ... Sunday = 8.
        let week_day = i64::from(today.weekday().number_from_monday()) + 1;

        let resolved = match modifier {
            DateModifier::Today => RelativeDate::Day(today),
            DateModifier::Tomorrow => RelativeDate::Day(days_after(today, 1)?),
            DateModifier::Yesterday => RelativeDate::Day(days_before(today, 1)?),
            DateModifier::OneWeekAgo => RelativeDate::Day(days_before(today, 7)?),
            DateModifier::OneWeekFromNow => RelativeDate::Day(days_after(today, 7)?),
            DateModifier::OneMonthAgo => RelativeDate::Day(months_before(today, 1)?),
            DateModifier::OneMonthFromNow => RelativeDate::Day(months_after(today, 1)?),
            DateModifier::NumberOfDaysAgo => {
                RelativeDate::Day(days_before(today, day_count(term)?)?)
            }
            DateModifier::NumberOfDaysFromNow => {
                RelativeDate::Day(days_after(today, day_count(term)?)?)
            }
            DateModifier::ExactDate => RelativeDate::Day(exact_date(term)?),
            DateModifier::ThePastWeek => RelativeDate::Range(
                days_before(today, week_day + 6)?,
                days_before(today, week_day)?,
            ),
            DateModifier::ThisWeek => RelativeDate::Range(
                days_before(today, week_day - 1)?,
                days_after(today, 7 - week_day)?,
            ),
            DateModifier::TheNextWeek => RelativeDate::Range(
                days_after(today, 7 - week_day)?,
                days_after(today, 14 - week_day)?,
            ),
            DateModifier::ThePastMonth => month_range(months_before(today, 1)?)?,
            DateModifier::ThisMonth => month_range(today)?,
            DateModifier::TheNextMonth => month_range(months_after(today, 1)?)?,
            DateModifier::ThePastYear => year_range(today.year() - 1)?,
            DateModifier::ThisYear => year_range(today.year())?,
            DateModifier::TheNextYear => year_range(today.year() + 1)?,
            DateModifier::TheNextNumbersOfDays => {
                RelativeDate::Range(today, days_after(today, day_count(term)?)?)
            }
            DateModifier::ThePastNumbersOfDays => {
                RelativeDate::Range(days_before(today, day_count(term)?)?, today)
            }
        };
        Ok(resolved)
    }
}

fn day_count(term: &str) -> QueryResult<i64> {
    term.trim()
        .parse::<i64>()
        .map_err(|_| QueryError::invalid_date_term(term, "expected a number of days"))
}

/// Parses a `YYYY-MM-DD` term.
pub fn exact_date(term: &str) -> QueryResult<NaiveDate> {
    NaiveDate::parse_from_str(term.trim(), "%Y-%m-%d")
        .map_err(|_| QueryError::invalid_date_term(term, "expected a date as YYYY-MM-DD"))
}

/// Moves `day` forward by `days`, failing outside the supported calendar.
pub(crate) fn days_after(day: NaiveDate, days: i64) -> QueryResult<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| day.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(day, days))
}

/// Moves `day` back by `days`, failing outside the supported calendar.
pub(crate) fn days_before(day: NaiveDate, days: i64) -> QueryResult<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| day.checked_sub_signed(delta))
        .ok_or_else(|| out_of_range(day, days.saturating_neg()))
}

fn out_of_range(day: NaiveDate, days: i64) -> QueryError {
    QueryError::invalid_date_term(format!("{day} {days:+} days"), "date out of range")
}

fn months_before(day: NaiveDate, months: u32) -> QueryResult<NaiveDate> {
    day.checked_sub_months(Months::new(months))
        .ok_or_else(|| QueryError::invalid_date_term(day.to_string(), "date out of range"))
}

fn months_after(day: NaiveDate, months: u32) -> QueryResult<NaiveDate> {
    day.checked_add_months(Months::new(months))
        .ok_or_else(|| QueryError::invalid_date_term(day.to_string(), "date out of range"))
}

fn month_range(day: NaiveDate) -> QueryResult<RelativeDate> {
    let out_of_range = || QueryError::invalid_date_term(day.to_string(), "date out of range");
    let first = day.with_day(1).ok_or_else(out_of_range)?;
    let last = days_before(months_after(first, 1)?, 1)?;
    Ok(RelativeDate::Range(first, last))
}

fn year_range(year: i32) -> QueryResult<RelativeDate> {
    let out_of_range = || QueryError::invalid_date_term(year.to_string(), "year out of range");
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(out_of_range)?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(out_of_range)?;
    Ok(RelativeDate::Range(first, last))
}
