//! Credit card purchases, filterable by card and by invoice month.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use finboard_core::aggregation::sum_amounts;
use finboard_core::calendar::{format_date_br, month_window, parse_date_value, YearMonth};
use finboard_core::forms::NewCardPurchase;
use finboard_core::money::{format_currency, parse_money};
use finboard_core::types::{row_bool, row_text, Row, TableName};
use finboard_db::{StoreError, TableStore};
use serde::Serialize;

use super::{write_table, ViewState};

/// Months before and after the current one offered as invoice filters.
const INVOICE_MONTHS_BACK: u32 = 6;
const INVOICE_MONTHS_FORWARD: u32 = 6;

/// Narrowing applied to the fetched purchases. `None` means all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub card: Option<String>,
    pub invoice_month: Option<YearMonth>,
}

impl CardFilter {
    fn accepts(&self, row: &Row) -> bool {
        let card_ok = self
            .card
            .as_deref()
            .map_or(true, |wanted| row_text(row, "cartao").as_deref() == Some(wanted));
        let month_ok = self
            .invoice_month
            .map_or(true, |wanted| invoice_month(row) == Some(wanted));
        card_ok && month_ok
    }
}

fn invoice_month(row: &Row) -> Option<YearMonth> {
    row.get("mes_fatura")
        .and_then(parse_date_value)
        .map(YearMonth::from_date)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseLine {
    pub card: String,
    pub purchase_date: Option<String>,
    pub invoice_month: Option<YearMonth>,
    pub description: String,
    /// `current/total` for installment purchases.
    pub installment: Option<String>,
    pub value: String,
    pub fixed: bool,
    pub forecast: bool,
}

impl PurchaseLine {
    fn from_row(row: &Row) -> Self {
        let installment = (row_bool(row, "parcelado") == Some(true)).then(|| {
            format!(
                "{}/{}",
                row_text(row, "parcela").unwrap_or_default(),
                row_text(row, "total_parcela").unwrap_or_default()
            )
        });
        Self {
            card: row_text(row, "cartao").unwrap_or_default(),
            purchase_date: row
                .get("data_compra")
                .and_then(parse_date_value)
                .map(format_date_br),
            invoice_month: invoice_month(row),
            description: row_text(row, "descricao").unwrap_or_default(),
            installment,
            value: format_currency(row.get("valor").and_then(parse_money).unwrap_or_default()),
            fixed: row_bool(row, "fixo") == Some(true),
            forecast: row_bool(row, "previsto") == Some(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CardReport {
    #[serde(flatten)]
    pub state: ViewState,
    /// Every card present in the table, sorted.
    pub cards: Vec<String>,
    /// Invoice months present in the table and near today, newest first.
    pub months: Vec<YearMonth>,
    pub purchases: Vec<PurchaseLine>,
    /// Sum of the listed purchases; empty when it cannot be computed.
    pub total: String,
}

/// Fetch the `card` table and apply `filter` to it.
///
/// The card and month choices are computed from the unfiltered rows so they
/// stay the same whichever filter is active.
pub async fn build<S>(store: &S, filter: &CardFilter, today: NaiveDate) -> CardReport
where
    S: TableStore + ?Sized,
{
    let outcome = store.fetch_outcome(&TableName::card(), None).await;
    let (mut state, rows) = ViewState::from_outcome(outcome);

    let cards: BTreeSet<String> = rows.iter().filter_map(|r| row_text(r, "cartao")).collect();

    let window = month_window(INVOICE_MONTHS_BACK, INVOICE_MONTHS_FORWARD, today);
    let months: BTreeSet<YearMonth> = rows
        .iter()
        .filter_map(invoice_month)
        .filter(|m| window.contains(*m))
        .collect();

    let selected: Vec<Row> = rows.into_iter().filter(|r| filter.accepts(r)).collect();
    tracing::debug!(
        card = ?filter.card,
        month = ?filter.invoice_month,
        rows = selected.len(),
        "Card purchases filtered"
    );

    let total = match sum_amounts(&selected, "valor") {
        Ok(total) => format_currency(total),
        Err(err) => {
            state = ViewState::from_totals_error(&err);
            String::new()
        }
    };

    CardReport {
        state,
        cards: cards.into_iter().collect(),
        months: months.into_iter().rev().collect(),
        total,
        purchases: selected.iter().map(PurchaseLine::from_row).collect(),
    }
}

/// Register a new purchase.
pub async fn add_purchase<S>(store: &S, purchase: NewCardPurchase) -> Result<Row, StoreError>
where
    S: TableStore + ?Sized,
{
    let fields = purchase.into_row()?;
    let row = store.create(&TableName::card(), &fields).await?;
    tracing::info!(card = ?row.get("cartao"), "Card purchase registered");
    Ok(row)
}

impl fmt::Display for CardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cartões")?;
        if !matches!(self.state, ViewState::Ready) {
            return writeln!(f, "{}", self.state);
        }

        let rows: Vec<Vec<String>> = self
            .purchases
            .iter()
            .map(|p| {
                vec![
                    p.card.clone(),
                    p.purchase_date.clone().unwrap_or_else(|| "-".into()),
                    p.invoice_month
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "-".into()),
                    p.description.clone(),
                    p.installment.clone().unwrap_or_default(),
                    p.value.clone(),
                    flags(p),
                ]
            })
            .collect();
        write_table(
            f,
            &["cartão", "compra", "fatura", "descrição", "parcela", "valor", ""],
            &rows,
        )?;
        writeln!(f, "\nTotal: {}", self.total)?;

        let months: Vec<String> = self.months.iter().map(YearMonth::to_string).collect();
        writeln!(f, "Cartões: {}", self.cards.join(", "))?;
        writeln!(f, "Faturas: {}", months.join(", "))
    }
}

fn flags(purchase: &PurchaseLine) -> String {
    let mut flags = Vec::new();
    if purchase.fixed {
        flags.push("fixo");
    }
    if purchase.forecast {
        flags.push("previsto");
    }
    flags.join(",")
}
