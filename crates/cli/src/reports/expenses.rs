//! Unplanned daily expenses of one month against a fixed monthly limit.

use std::fmt;

use finboard_core::aggregation::sum_amounts;
use finboard_core::calendar::{format_date_br, parse_date_value, YearMonth};
use finboard_core::error::CoreError;
use finboard_core::forms::NewExpense;
use finboard_core::money::{compute_percentage, format_currency, parse_money};
use finboard_core::types::{row_text, Row, TableName};
use finboard_db::{Filter, StoreError, TableStore};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{write_metrics, write_table, Metric, ViewState};

const DATE_COLUMN: &str = "created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseLine {
    pub date: Option<String>,
    pub description: String,
    pub value: String,
    pub payment_type: Option<String>,
}

impl ExpenseLine {
    fn from_row(row: &Row) -> Self {
        Self {
            date: row
                .get(DATE_COLUMN)
                .and_then(parse_date_value)
                .map(format_date_br),
            description: row_text(row, "description").unwrap_or_default(),
            value: format_currency(row.get("value").and_then(parse_money).unwrap_or_default()),
            payment_type: row_text(row, "payment_type"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpensesReport {
    #[serde(flatten)]
    pub state: ViewState,
    pub month: YearMonth,
    pub expenses: Vec<ExpenseLine>,
    /// Empty when the month could not be fetched.
    pub metrics: Vec<Metric>,
}

/// Fetch the expenses created within `month` and compare them to `limit`.
pub async fn build<S>(store: &S, month: YearMonth, limit: Decimal) -> ExpensesReport
where
    S: TableStore + ?Sized,
{
    let filter = Filter::new().within_month(DATE_COLUMN, month);
    let outcome = store
        .fetch_outcome(&TableName::expenses_daily(), Some(&filter))
        .await;
    let (mut state, rows) = ViewState::from_outcome(outcome);

    let metrics = if state.is_failed() {
        Vec::new()
    } else {
        match limit_metrics(&rows, limit) {
            Ok(metrics) => metrics,
            Err(err) => {
                state = ViewState::from_totals_error(&err);
                Vec::new()
            }
        }
    };

    ExpensesReport {
        state,
        month,
        expenses: rows.iter().map(ExpenseLine::from_row).collect(),
        metrics,
    }
}

fn limit_metrics(rows: &[Row], limit: Decimal) -> Result<Vec<Metric>, CoreError> {
    let spent = sum_amounts(rows, "value")?;
    let remaining = limit
        .checked_sub(spent)
        .ok_or_else(|| CoreError::InvalidInput("remaining limit is out of range".into()))?;
    Ok(vec![
        Metric::new("Limite Total", format_currency(limit), None),
        Metric::new(
            "Total Gasto",
            format_currency(spent),
            Some(compute_percentage(spent, limit)),
        ),
        Metric::new(
            "Saldo Total",
            format_currency(remaining),
            Some(compute_percentage(remaining, limit)),
        ),
    ])
}

/// Record a new expense.
pub async fn add_expense<S>(store: &S, expense: NewExpense) -> Result<Row, StoreError>
where
    S: TableStore + ?Sized,
{
    let fields = expense.into_row()?;
    let row = store.create(&TableName::expenses_daily(), &fields).await?;
    tracing::info!(id = ?row.get("id"), "Expense recorded");
    Ok(row)
}

impl fmt::Display for ExpensesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gastos - {} {}", self.month.month_name_pt(), self.month.year())?;
        match &self.state {
            ViewState::Ready => {
                let rows: Vec<Vec<String>> = self
                    .expenses
                    .iter()
                    .map(|e| {
                        vec![
                            e.date.clone().unwrap_or_else(|| "-".into()),
                            e.description.clone(),
                            e.value.clone(),
                            e.payment_type.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                write_table(f, &["data", "descrição", "valor", "pagamento"], &rows)?;
            }
            other => writeln!(f, "{other}")?,
        }

        if !self.metrics.is_empty() {
            writeln!(f)?;
            write_metrics(f, &self.metrics)?;
        }
        Ok(())
    }
}
