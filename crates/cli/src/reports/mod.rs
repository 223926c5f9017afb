//! One report per dashboard table.
//!
//! A report is built from a [`TableStore`](finboard_db::TableStore) in one
//! call and is plain data afterwards: it renders as text through `Display`
//! and as JSON through `Serialize`.

use std::fmt;

use finboard_core::error::CoreError;
use finboard_core::types::Row;
use finboard_db::FetchOutcome;
use serde::Serialize;

pub mod apartment;
pub mod card;
pub mod expenses;

/// One headline figure with an optional percentage beside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

impl Metric {
    pub fn new(label: &'static str, value: String, delta: Option<String>) -> Self {
        Self { label, value, delta }
    }
}

/// Whether a report's table part has rows, has none, or could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    Ready,
    NoData,
    Failed { reason: String },
}

impl ViewState {
    /// Split a fetch outcome into the state to show and the rows to use.
    pub(crate) fn from_outcome(outcome: FetchOutcome) -> (Self, Vec<Row>) {
        match outcome {
            FetchOutcome::Rows(rows) => (Self::Ready, rows),
            FetchOutcome::Empty => (Self::NoData, Vec::new()),
            FetchOutcome::Failed(err) => {
                tracing::warn!(error = %err, "Report fetch failed");
                let reason = format!("fetch failed: {err}");
                (Self::Failed { reason }, Vec::new())
            }
        }
    }

    /// Replace a loaded state when the derived totals cannot be computed.
    pub(crate) fn from_totals_error(err: &CoreError) -> Self {
        tracing::warn!(error = %err, "Report totals unavailable");
        Self::Failed {
            reason: format!("totals unavailable: {err}"),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => Ok(()),
            Self::NoData => f.write_str("no data"),
            Self::Failed { reason } => f.write_str(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Text layout
// ---------------------------------------------------------------------------

/// Write `rows` as left-aligned columns under `headers`.
pub(crate) fn write_table(
    f: &mut fmt::Formatter<'_>,
    headers: &[&str],
    rows: &[Vec<String>],
) -> fmt::Result {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_row(f, headers.iter().copied(), &widths)?;
    let rules: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(f, rules.iter().map(String::as_str), &widths)?;
    for row in rows {
        write_row(f, row.iter().map(String::as_str), &widths)?;
    }
    Ok(())
}

fn write_row<'a>(
    f: &mut fmt::Formatter<'_>,
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
) -> fmt::Result {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    writeln!(f, "{}", padded.join("  ").trim_end())
}

pub(crate) fn write_metrics(f: &mut fmt::Formatter<'_>, metrics: &[Metric]) -> fmt::Result {
    for metric in metrics {
        match &metric.delta {
            Some(delta) => writeln!(f, "{:<16} {}  ({delta})", metric.label, metric.value)?,
            None => writeln!(f, "{:<16} {}", metric.label, metric.value)?,
        }
    }
    Ok(())
}
