//! Apartment installments: payment schedule, totals before delivery and the
//! contract balance after delivery.

use std::fmt;

use finboard_core::aggregation::{compute_totals, sort_by_due_date};
use finboard_core::calendar::{format_date_br, parse_date_value};
use finboard_core::error::CoreError;
use finboard_core::forms::InstallmentEdit;
use finboard_core::money::{compute_percentage, format_currency, parse_money};
use finboard_core::types::{row_bool, row_text, Row, RowId, TableName};
use finboard_db::{StoreError, TableStore};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{write_metrics, write_table, Metric, ViewState};
use crate::config::DashboardConfig;

const FULL_SHARE: &str = "100%";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallmentLine {
    pub id: Option<String>,
    pub due: Option<String>,
    pub value: String,
    pub installment: String,
    pub paid: bool,
}

impl InstallmentLine {
    fn from_row(row: &Row) -> Self {
        Self {
            id: RowId::of(row).map(|id| id.to_string()),
            due: row
                .get("expired_at")
                .and_then(parse_date_value)
                .map(format_date_br),
            value: format_currency(row.get("value").and_then(parse_money).unwrap_or_default()),
            installment: row_text(row, "installment").unwrap_or_default(),
            paid: row_bool(row, "status") == Some(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApartmentReport {
    #[serde(flatten)]
    pub state: ViewState,
    pub installments: Vec<InstallmentLine>,
    /// Empty when the installments could not be fetched.
    pub pre_delivery: Vec<Metric>,
    pub post_delivery: Vec<Metric>,
}

/// Fetch the `apartment` table and lay it out.
pub async fn build<S>(store: &S, config: &DashboardConfig) -> ApartmentReport
where
    S: TableStore + ?Sized,
{
    let outcome = store.fetch_outcome(&TableName::apartment(), None).await;
    let (mut state, rows) = ViewState::from_outcome(outcome);

    let pre_delivery = if state.is_failed() {
        Ok(Vec::new())
    } else {
        compute_totals(&rows, "value", "status").and_then(|totals| {
            share_metrics(
                ["Total Geral", "Total Pago", "Total Pendente"],
                totals.total,
                totals.settled,
            )
        })
    };
    let post_delivery = share_metrics(
        ["Valor Total", "Total Pago", "Saldo Restante"],
        config.contract_total,
        config.contract_paid,
    );

    let (pre_delivery, post_delivery) = match (pre_delivery, post_delivery) {
        (Ok(pre), Ok(post)) => (pre, post),
        (Err(err), _) | (_, Err(err)) => {
            state = ViewState::from_totals_error(&err);
            (Vec::new(), Vec::new())
        }
    };

    let installments = sort_by_due_date(&rows, "expired_at")
        .iter()
        .map(InstallmentLine::from_row)
        .collect();

    ApartmentReport {
        state,
        installments,
        pre_delivery,
        post_delivery,
    }
}

/// Whole, paid and remaining amounts, the last two as a share of the whole.
fn share_metrics(
    labels: [&'static str; 3],
    whole: Decimal,
    paid: Decimal,
) -> Result<Vec<Metric>, CoreError> {
    let [whole_label, paid_label, rest_label] = labels;
    let rest = whole
        .checked_sub(paid)
        .ok_or_else(|| CoreError::InvalidInput(format!("'{rest_label}' is out of range")))?;
    Ok(vec![
        Metric::new(whole_label, format_currency(whole), Some(FULL_SHARE.into())),
        Metric::new(
            paid_label,
            format_currency(paid),
            Some(compute_percentage(paid, whole)),
        ),
        Metric::new(
            rest_label,
            format_currency(rest),
            Some(compute_percentage(rest, whole)),
        ),
    ])
}

/// Overwrite value, label and status of one installment.
pub async fn update_installment<S>(
    store: &S,
    id: &RowId,
    edit: InstallmentEdit,
) -> Result<Row, StoreError>
where
    S: TableStore + ?Sized,
{
    let fields = edit.into_row()?;
    let row = store.update(&TableName::apartment(), id, &fields).await?;
    tracing::info!(id = %id, "Apartment installment updated");
    Ok(row)
}

impl fmt::Display for ApartmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Apartment")?;
        match &self.state {
            ViewState::Ready => {
                let rows: Vec<Vec<String>> = self
                    .installments
                    .iter()
                    .map(|line| {
                        vec![
                            line.id.clone().unwrap_or_default(),
                            line.due.clone().unwrap_or_else(|| "-".into()),
                            line.value.clone(),
                            line.installment.clone(),
                            String::from(if line.paid { "pago" } else { "pendente" }),
                        ]
                    })
                    .collect();
                write_table(f, &["id", "vencimento", "valor", "parcela", "status"], &rows)?;
            }
            other => writeln!(f, "{other}")?,
        }

        if !self.pre_delivery.is_empty() {
            writeln!(f, "\nPré Entrega")?;
            write_metrics(f, &self.pre_delivery)?;
        }
        if !self.post_delivery.is_empty() {
            writeln!(f, "\nPós Entrega")?;
            write_metrics(f, &self.post_delivery)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::reports::testing::MemoryStore;

    fn store() -> MemoryStore {
        MemoryStore::with(
            "apartment",
            json!([
                {"id": 1, "expired_at": "2024-03-10", "value": 1000,
                 "installment": "3/36", "status": false},
                {"id": 2, "expired_at": "2024-01-10", "value": 1000,
                 "installment": "1/36", "status": true},
                {"id": 3, "expired_at": "2024-02-10", "value": 1500.5,
                 "installment": "2/36", "status": "true"},
            ]),
        )
    }

    #[tokio::test]
    async fn installments_follow_due_date() {
        let report = build(&store(), &DashboardConfig::default()).await;
        assert_eq!(report.state, ViewState::Ready);

        let labels: Vec<&str> = report
            .installments
            .iter()
            .map(|l| l.installment.as_str())
            .collect();
        assert_eq!(labels, vec!["1/36", "2/36", "3/36"]);
        assert_eq!(report.installments[0].due.as_deref(), Some("10/01/2024"));
        assert_eq!(report.installments[1].value, "R$ 1.500,50");
    }

    #[tokio::test]
    async fn pre_delivery_splits_paid_and_pending() {
        let report = build(&store(), &DashboardConfig::default()).await;
        let values: Vec<(&str, &str, Option<&str>)> = report
            .pre_delivery
            .iter()
            .map(|m| (m.label, m.value.as_str(), m.delta.as_deref()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("Total Geral", "R$ 3.500,50", Some("100%")),
                ("Total Pago", "R$ 2.500,50", Some("71,43%")),
                ("Total Pendente", "R$ 1.000,00", Some("28,57%")),
            ]
        );
    }

    #[tokio::test]
    async fn post_delivery_uses_contract_figures() {
        let report = build(&MemoryStore::default(), &DashboardConfig::default()).await;
        assert_eq!(report.post_delivery[0].value, "R$ 503.000,00");
        assert_eq!(report.post_delivery[1].delta.as_deref(), Some("19,09%"));
        assert_eq!(report.post_delivery[2].value, "R$ 407.000,00");
        assert_eq!(report.post_delivery[2].delta.as_deref(), Some("80,91%"));
    }

    #[tokio::test]
    async fn empty_table_shows_zero_totals() {
        let report = build(&MemoryStore::default(), &DashboardConfig::default()).await;
        assert_eq!(report.state, ViewState::NoData);
        assert_eq!(report.pre_delivery[0].value, "R$ 0,00");
        assert_eq!(report.pre_delivery[1].delta.as_deref(), Some("0%"));
        assert!(report.to_string().contains("no data"));
    }

    #[tokio::test]
    async fn failed_fetch_is_not_shown_as_zero() {
        let report = build(&MemoryStore::failing(), &DashboardConfig::default()).await;
        assert_matches!(report.state, ViewState::Failed { ref reason } if reason.contains("503"));
        assert!(report.pre_delivery.is_empty());

        let text = report.to_string();
        assert!(text.contains("fetch failed"), "{text}");
        assert!(!text.contains("Pré Entrega"), "{text}");
    }

    #[tokio::test]
    async fn totals_out_of_range_fail_the_report() {
        let store = MemoryStore::with(
            "apartment",
            json!([
                {"id": 1, "expired_at": "2024-01-10", "value": 5e28, "status": true},
                {"id": 2, "expired_at": "2024-02-10", "value": 5e28, "status": false},
            ]),
        );

        let report = build(&store, &DashboardConfig::default()).await;
        assert_matches!(
            report.state,
            ViewState::Failed { ref reason } if reason.contains("totals unavailable")
        );
        assert!(report.pre_delivery.is_empty());
        assert_eq!(report.installments.len(), 2);

        let text = report.to_string();
        assert!(text.contains("out of range"), "{text}");
        assert!(!text.contains("Pré Entrega"), "{text}");
    }

    #[test]
    fn remaining_share_out_of_range_is_an_error() {
        let err = share_metrics(["a", "b", "c"], Decimal::MAX, -Decimal::MAX).unwrap_err();
        assert_matches!(err, CoreError::InvalidInput(msg) if msg.contains("'c'"));
    }

    #[tokio::test]
    async fn update_overwrites_the_installment() {
        let store = store();
        let edit = InstallmentEdit {
            value: "1100".parse().unwrap(),
            installment: "3/36".into(),
            status: true,
        };

        let row = update_installment(&store, &RowId::from(1), edit).await.unwrap();
        assert_eq!(row["status"], json!(true));
        assert_eq!(row["value"], json!(1100));
        assert_eq!(row["expired_at"], json!("2024-03-10"));
    }

    #[tokio::test]
    async fn invalid_edit_is_rejected_locally() {
        let store = store();
        let edit = InstallmentEdit {
            value: "-5".parse().unwrap(),
            installment: "3/36".into(),
            status: true,
        };

        let err = update_installment(&store, &RowId::from(1), edit).await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
        assert_eq!(store.rows("apartment")[0]["value"], json!(1000));
    }

    #[test]
    fn json_output_flattens_state() {
        let report = ApartmentReport {
            state: ViewState::NoData,
            installments: Vec::new(),
            pre_delivery: Vec::new(),
            post_delivery: Vec::new(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["state"], json!("no_data"));
    }
}
