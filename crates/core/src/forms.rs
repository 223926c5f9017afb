//! Input forms for new and edited rows.
//!
//! Each form validates itself before it can be turned into a [`Row`], so an
//! invalid submission never reaches the table client.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::calendar::{iso, YearMonth};
use crate::error::CoreError;
use crate::money::money_to_json;
use crate::types::Row;

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("must not be blank")));
    }
    Ok(())
}

fn non_zero(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::new("zero").with_message(Cow::Borrowed("must not be zero")));
    }
    Ok(())
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(
            ValidationError::new("negative").with_message(Cow::Borrowed("must not be negative"))
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Payment type
// ---------------------------------------------------------------------------

/// How a daily expense was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Credit,
    Debit,
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl FromStr for PaymentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(CoreError::InvalidInput(format!(
                "unknown payment type '{other}', expected credit or debit"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Card issuer
// ---------------------------------------------------------------------------

/// Credit cards purchases can be registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardIssuer {
    BradescoAmerican,
    C6,
    Inter,
    MercadoPago,
    SantanderVisa,
    SantanderVisaCash,
    SantanderMaster,
}

impl CardIssuer {
    pub const ALL: [CardIssuer; 7] = [
        Self::BradescoAmerican,
        Self::C6,
        Self::Inter,
        Self::MercadoPago,
        Self::SantanderVisa,
        Self::SantanderVisaCash,
        Self::SantanderMaster,
    ];

    /// Label stored in the `cartao` column.
    pub fn label(self) -> &'static str {
        match self {
            Self::BradescoAmerican => "Bradesco American",
            Self::C6 => "C6",
            Self::Inter => "Inter",
            Self::MercadoPago => "MercadoPago",
            Self::SantanderVisa => "Santander Visa",
            Self::SantanderVisaCash => "Santander Visa Cash",
            Self::SantanderMaster => "Santander Master",
        }
    }
}

impl fmt::Display for CardIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CardIssuer {
    type Err = CoreError;

    /// Match a label ignoring case and whitespace, so `"santander visa"` and
    /// `"SantanderVisa"` both resolve.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL
            .into_iter()
            .find(|card| {
                let label: String = card.label().chars().filter(|c| !c.is_whitespace()).collect();
                label.eq_ignore_ascii_case(&wanted)
            })
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown card '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Daily expense
// ---------------------------------------------------------------------------

/// A new row for the `expenses_daily` table.
#[derive(Debug, Clone, Validate)]
pub struct NewExpense {
    pub date: NaiveDate,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    #[validate(custom(function = "non_zero"))]
    pub value: Decimal,
    #[validate(required(message = "is required"))]
    pub payment_type: Option<PaymentType>,
}

impl NewExpense {
    /// Validate and convert into the columns of `expenses_daily`.
    pub fn into_row(self) -> Result<Row, CoreError> {
        self.validate()?;
        let mut row = Row::new();
        row.insert("created_at".into(), Value::String(iso(self.date)));
        row.insert("description".into(), Value::String(self.description.trim().to_string()));
        row.insert("value".into(), money_to_json(self.value));
        if let Some(payment_type) = self.payment_type {
            row.insert("payment_type".into(), Value::String(payment_type.as_str().into()));
        }
        Ok(row)
    }
}

// ---------------------------------------------------------------------------
// Card purchase
// ---------------------------------------------------------------------------

fn installments_in_range(purchase: &NewCardPurchase) -> Result<(), ValidationError> {
    if purchase.installments
        && purchase.total_installments > 0
        && purchase.installment > purchase.total_installments
    {
        return Err(ValidationError::new("installment_range").with_message(Cow::Borrowed(
            "current installment cannot exceed the total number of installments",
        )));
    }
    Ok(())
}

/// A new row for the `card` table.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "installments_in_range"))]
pub struct NewCardPurchase {
    pub card: CardIssuer,
    pub purchase_date: NaiveDate,
    pub invoice_month: YearMonth,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    pub installments: bool,
    pub installment: u32,
    pub total_installments: u32,
    pub value: Decimal,
    pub fixed: bool,
    pub forecast: bool,
}

impl NewCardPurchase {
    /// Validate and convert into the columns of `card`.
    ///
    /// The invoice month is stored as the first day of that month.
    pub fn into_row(self) -> Result<Row, CoreError> {
        self.validate()?;
        let invoice_day = self.invoice_month.first_day().ok_or_else(|| {
            CoreError::InvalidInput(format!("invoice month {} is out of range", self.invoice_month))
        })?;

        let mut row = Row::new();
        row.insert("cartao".into(), Value::String(self.card.label().into()));
        row.insert("data_compra".into(), Value::String(iso(self.purchase_date)));
        row.insert("mes_fatura".into(), Value::String(iso(invoice_day)));
        row.insert("descricao".into(), Value::String(self.description.trim().to_string()));
        row.insert("parcelado".into(), Value::Bool(self.installments));
        row.insert("parcela".into(), Value::from(self.installment));
        row.insert("total_parcela".into(), Value::from(self.total_installments));
        row.insert("valor".into(), money_to_json(self.value));
        row.insert("fixo".into(), Value::Bool(self.fixed));
        row.insert("previsto".into(), Value::Bool(self.forecast));
        Ok(row)
    }
}

// ---------------------------------------------------------------------------
// Apartment installment edit
// ---------------------------------------------------------------------------

/// Replacement values for one `apartment` installment.
#[derive(Debug, Clone, Validate)]
pub struct InstallmentEdit {
    #[validate(custom(function = "non_negative"))]
    pub value: Decimal,
    #[validate(custom(function = "not_blank"))]
    pub installment: String,
    pub status: bool,
}

impl InstallmentEdit {
    /// Validate and convert into the overwritten columns.
    pub fn into_row(self) -> Result<Row, CoreError> {
        self.validate()?;
        let mut row = Row::new();
        row.insert("value".into(), money_to_json(self.value));
        row.insert("installment".into(), Value::String(self.installment.trim().to_string()));
        row.insert("status".into(), Value::Bool(self.status));
        Ok(row)
    }
}
