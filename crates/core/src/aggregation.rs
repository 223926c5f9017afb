//! Totals and orderings derived from fetched rows.
//!
//! Every function here borrows its input and returns new values; fetched
//! rows are never modified in place.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calendar::parse_date_value;
use crate::error::CoreError;
use crate::money::parse_money;
use crate::types::{row_bool, Row};

/// Sum of an amount column split by a paid/unpaid flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub total: Decimal,
    pub settled: Decimal,
    pub outstanding: Decimal,
}

/// Sum `amount_field` over `rows`, and separately over the rows whose
/// `status_field` is `true`.
///
/// Rows with a missing or non-numeric amount contribute zero. An empty slice
/// gives all-zero totals. A sum that leaves the `Decimal` range returns
/// [`CoreError::InvalidInput`].
pub fn compute_totals(
    rows: &[Row],
    amount_field: &str,
    status_field: &str,
) -> Result<Totals, CoreError> {
    let mut total = Decimal::ZERO;
    let mut settled = Decimal::ZERO;

    for row in rows {
        let amount = row
            .get(amount_field)
            .and_then(parse_money)
            .unwrap_or(Decimal::ZERO);
        total = checked_sum(total, amount, amount_field)?;
        if row_bool(row, status_field) == Some(true) {
            settled = checked_sum(settled, amount, amount_field)?;
        }
    }

    let outstanding = total
        .checked_sub(settled)
        .ok_or_else(|| overflow(amount_field))?;
    Ok(Totals {
        total,
        settled,
        outstanding,
    })
}

/// Sum one amount column with no status split.
pub fn sum_amounts(rows: &[Row], amount_field: &str) -> Result<Decimal, CoreError> {
    rows.iter()
        .filter_map(|row| row.get(amount_field).and_then(parse_money))
        .try_fold(Decimal::ZERO, |acc, amount| checked_sum(acc, amount, amount_field))
}

fn checked_sum(acc: Decimal, amount: Decimal, field: &str) -> Result<Decimal, CoreError> {
    acc.checked_add(amount).ok_or_else(|| overflow(field))
}

fn overflow(field: &str) -> CoreError {
    CoreError::InvalidInput(format!("sum of '{field}' is out of range"))
}

/// Order rows by the date in `date_field`, oldest first.
///
/// The sort is stable. Rows whose date is missing or unparseable take no part
/// in the ordering: they follow the dated rows, in their original order.
pub fn sort_by_due_date(rows: &[Row], date_field: &str) -> Vec<Row> {
    let mut dated = Vec::with_capacity(rows.len());
    let mut undated = Vec::new();

    for row in rows {
        match row.get(date_field).and_then(parse_date_value) {
            Some(date) => dated.push((date, row.clone())),
            None => undated.push(row.clone()),
        }
    }

    dated.sort_by_key(|(date, _)| *date);
    dated
        .into_iter()
        .map(|(_, row)| row)
        .chain(undated)
        .collect()
}
