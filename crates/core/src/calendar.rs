//! Calendar helpers: year-month labels, month windows and date parsing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Month names in Portuguese, January first.
const MONTH_NAMES_PT: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
    "Outubro", "Novembro", "Dezembro",
];

// ---------------------------------------------------------------------------
// YearMonth
// ---------------------------------------------------------------------------

/// A calendar month without a day, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub const MIN: Self = Self {
        year: i32::MIN,
        month: 1,
    };

    pub const MAX: Self = Self {
        year: i32::MAX,
        month: 12,
    };

    /// Build a year-month; `month` is 1-based.
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidInput(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Shift by a signed number of months, saturating at the first and last
    /// representable months.
    pub fn add_months(self, delta: i32) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 + i64::from(delta);
        let year = index.div_euclid(12);
        match i32::try_from(year) {
            Ok(year) => Self {
                year,
                month: index.rem_euclid(12) as u32 + 1,
            },
            Err(_) if year < 0 => Self::MIN,
            Err(_) => Self::MAX,
        }
    }

    pub fn succ(self) -> Self {
        self.add_months(1)
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// First day of the following month: the exclusive upper bound of this
    /// month as a date range.
    pub fn next_month_first_day(self) -> Option<NaiveDate> {
        self.succ().first_day()
    }

    /// Portuguese month name, e.g. `Março`.
    pub fn month_name_pt(self) -> &'static str {
        MONTH_NAMES_PT[(self.month - 1) as usize]
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = CoreError;

    /// Parse `YYYY-MM`; a trailing `-DD` is tolerated and ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidInput(format!("'{s}' is not a YYYY-MM month"));
        let mut parts = s.trim().splitn(3, '-');
        let year = parts
            .next()
            .filter(|p| p.len() == 4)
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let month = parts
            .next()
            .filter(|p| p.len() == 2)
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for YearMonth {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Month window
// ---------------------------------------------------------------------------

/// Inclusive range of months around a reference month.
///
/// The window itself is a cheap value; every call to [`MonthWindow::iter`]
/// (or `into_iter`) starts a fresh pass from the first month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    start: YearMonth,
    end: YearMonth,
}

impl MonthWindow {
    pub fn contains(&self, month: YearMonth) -> bool {
        self.start <= month && month <= self.end
    }

    pub fn len(&self) -> usize {
        let span = (i64::from(self.end.year) - i64::from(self.start.year)) * 12
            + i64::from(self.end.month)
            - i64::from(self.start.month);
        if span < 0 {
            return 0;
        }
        usize::try_from(span + 1).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> MonthIter {
        MonthIter {
            next: self.start,
            end: self.end,
            exhausted: self.start > self.end,
        }
    }
}

impl IntoIterator for MonthWindow {
    type Item = YearMonth;
    type IntoIter = MonthIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &MonthWindow {
    type Item = YearMonth;
    type IntoIter = MonthIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending pass over a [`MonthWindow`].
#[derive(Debug, Clone)]
pub struct MonthIter {
    next: YearMonth,
    end: YearMonth,
    exhausted: bool,
}

impl Iterator for MonthIter {
    type Item = YearMonth;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let current = self.next;
        if current >= self.end {
            self.exhausted = true;
        } else {
            self.next = current.succ();
        }
        Some(current)
    }
}

/// Months from `months_back` before to `months_forward` after the month of
/// `reference`, both ends included.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use finboard_core::calendar::month_window;
///
/// let window = month_window(6, 6, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
/// let labels: Vec<String> = window.iter().map(|m| m.to_string()).collect();
/// assert_eq!(labels.len(), 13);
/// assert_eq!(labels.first().unwrap(), "2023-12");
/// assert_eq!(labels.last().unwrap(), "2024-12");
/// ```
pub fn month_window(months_back: u32, months_forward: u32, reference: NaiveDate) -> MonthWindow {
    let anchor = YearMonth::from_date(reference);
    let back = i32::try_from(months_back).unwrap_or(i32::MAX);
    let forward = i32::try_from(months_forward).unwrap_or(i32::MAX);
    MonthWindow {
        start: anchor.add_months(-back),
        end: anchor.add_months(forward),
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse the date part of a backend date or timestamp string.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, naive timestamps with a `T` or
/// a space separator, and `DD/MM/YYYY`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(text, "%d/%m/%Y").ok()
}

/// Parse a date out of a JSON cell; non-strings are `None`.
pub fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    value.as_str().and_then(parse_date)
}

/// Render a date as `DD/MM/YYYY`.
pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Render a date as `YYYY-MM-DD`, the form the backend stores.
pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // -- YearMonth --

    #[test]
    fn year_month_parse_and_display() {
        assert_eq!(ym("2024-06").to_string(), "2024-06");
        assert_eq!(ym("2024-06-01"), ym("2024-06"));
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("24-06".parse::<YearMonth>().is_err());
        assert!("junho".parse::<YearMonth>().is_err());
    }

    #[test]
    fn add_months_crosses_years() {
        assert_eq!(ym("2024-01").add_months(-1), ym("2023-12"));
        assert_eq!(ym("2024-12").add_months(1), ym("2025-01"));
        assert_eq!(ym("2024-06").add_months(-18), ym("2022-12"));
        assert_eq!(ym("2024-06").add_months(0), ym("2024-06"));
    }

    #[test]
    fn add_months_saturates_at_the_representable_range() {
        let last = YearMonth::new(i32::MAX, 11).unwrap();
        assert_eq!(last.add_months(1), YearMonth::MAX);
        assert_eq!(last.add_months(i32::MAX), YearMonth::MAX);
        assert_eq!(YearMonth::MAX.succ(), YearMonth::MAX);
        assert_eq!(YearMonth::new(i32::MIN, 2).unwrap().add_months(-5), YearMonth::MIN);
        assert_eq!(ym("2024-06").add_months(i32::MAX).month(), 1);
        assert_eq!(YearMonth::MAX.first_day(), None);
    }

    #[test]
    fn month_bounds() {
        assert_eq!(ym("2024-12").first_day(), Some(date(2024, 12, 1)));
        assert_eq!(ym("2024-12").next_month_first_day(), Some(date(2025, 1, 1)));
        assert_eq!(ym("2024-02").next_month_first_day(), Some(date(2024, 3, 1)));
    }

    #[test]
    fn month_name_in_portuguese() {
        assert_eq!(ym("2024-03").month_name_pt(), "Março");
        assert_eq!(ym("2024-12").month_name_pt(), "Dezembro");
    }

    #[test]
    fn year_month_orders_chronologically() {
        assert!(ym("2023-12") < ym("2024-01"));
        assert!(ym("2024-02") > ym("2024-01"));
    }

    #[test]
    fn year_month_serde_as_label() {
        let json = serde_json::to_string(&ym("2024-06")).unwrap();
        assert_eq!(json, "\"2024-06\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ym("2024-06"));
    }

    // -- month_window --

    #[test]
    fn window_six_back_six_forward() {
        let window = month_window(6, 6, date(2024, 6, 20));
        let months: Vec<YearMonth> = window.iter().collect();
        assert_eq!(months.len(), 13);
        assert_eq!(window.len(), 13);
        assert_eq!(months[0], ym("2023-12"));
        assert_eq!(months[12], ym("2024-12"));
        assert!(months.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn window_is_restartable() {
        let window = month_window(1, 1, date(2024, 1, 1));
        let first: Vec<YearMonth> = window.iter().collect();
        let second: Vec<YearMonth> = window.into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![ym("2023-12"), ym("2024-01"), ym("2024-02")]);
    }

    #[test]
    fn window_of_zero_offsets_is_reference_month() {
        let window = month_window(0, 0, date(2024, 6, 30));
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![ym("2024-06")]);
        assert!(window.contains(ym("2024-06")));
        assert!(!window.contains(ym("2024-07")));
    }

    #[test]
    fn huge_offsets_still_surround_the_reference_month() {
        let reference = date(2024, 6, 20);
        let window = month_window(u32::MAX, u32::MAX, reference);
        assert!(window.contains(ym("2024-06")));
        assert!(window.contains(ym("1900-01")));
        assert!(window.contains(ym("9999-12")));
        assert!(window.len() > 13);

        let back_only = month_window(u32::MAX, 0, reference);
        assert!(back_only.contains(ym("2024-05")));
        assert!(!back_only.contains(ym("2024-07")));
    }

    // -- parse_date --

    #[test]
    fn parses_mixed_formats() {
        let d = date(2024, 6, 5);
        assert_eq!(parse_date("2024-06-05"), Some(d));
        assert_eq!(parse_date("2024-06-05T13:45:00"), Some(d));
        assert_eq!(parse_date("2024-06-05T13:45:00.123456"), Some(d));
        assert_eq!(parse_date("2024-06-05 13:45:00"), Some(d));
        assert_eq!(parse_date("2024-06-05T13:45:00+00:00"), Some(d));
        assert_eq!(parse_date("05/06/2024"), Some(d));
    }

    #[test]
    fn rejects_garbage_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date_value(&serde_json::json!(20240605)), None);
    }

    #[test]
    fn formats_brazilian_and_iso() {
        assert_eq!(format_date_br(date(2024, 6, 5)), "05/06/2024");
        assert_eq!(iso(date(2024, 6, 5)), "2024-06-05");
    }
}
