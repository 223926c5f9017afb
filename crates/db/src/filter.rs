//! Server-side row filters and their query-string encoding.
//!
//! A [`Filter`] is a conjunction of column comparisons. It is sent as a
//! single `and=(col.op.value,...)` parameter, the grammar PostgREST-style
//! stores accept.

use std::fmt;

use finboard_core::calendar::YearMonth;
use finboard_core::error::CoreError;

/// Name of the query parameter carrying the conjunction.
pub const AND_PARAM: &str = "and";

/// Comparison operator of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// `column >= value`
    Gte,
    /// `column < value`
    Lt,
    /// `column == value`
    Eq,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Eq => "eq",
        }
    }
}

/// One `column op value` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Predicate {
    column: String,
    op: FilterOp,
    value: String,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.column, self.op.as_str(), quote_value(&self.value))
    }
}

/// Conjunction of predicates, applied by the backend at fetch time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gte(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.push(column, FilterOp::Gte, value)
    }

    pub fn lt(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.push(column, FilterOp::Lt, value)
    }

    pub fn equals(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.push(column, FilterOp::Eq, value)
    }

    /// Restrict `column` to dates inside `month`: on or after its first day
    /// and before the first day of the next month.
    pub fn within_month(self, column: &str, month: YearMonth) -> Self {
        self.gte(column, format!("{month}-01"))
            .lt(column, format!("{}-01", month.succ()))
    }

    fn push(mut self, column: impl Into<String>, op: FilterOp, value: impl ToString) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            op,
            value: value.to_string(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Check that every column is a plain identifier.
    pub fn validate(&self) -> Result<(), CoreError> {
        for p in &self.predicates {
            let valid = !p.column.is_empty()
                && p.column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(CoreError::InvalidInput(format!(
                    "filter column '{}' is not a plain identifier",
                    p.column
                )));
            }
        }
        Ok(())
    }

    /// Value of the `and` parameter, e.g. `(created_at.gte.2024-06-01,created_at.lt.2024-07-01)`.
    /// `None` for an empty filter.
    pub fn and_expression(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        let joined: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
        Some(format!("({})", joined.join(",")))
    }

    /// Query pairs to attach to a GET request.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.and_expression()
            .map(|expr| vec![(AND_PARAM, expr)])
            .unwrap_or_default()
    }
}

/// Values holding grammar characters are double-quoted, with `"` and `\`
/// backslash-escaped.
fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\') || c.is_whitespace());
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_query() {
        let filter = Filter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.and_expression(), None);
        assert!(filter.query_pairs().is_empty());
    }

    #[test]
    fn month_filter_matches_range_grammar() {
        let month: YearMonth = "2024-06".parse().unwrap();
        let filter = Filter::new().within_month("created_at", month);
        assert_eq!(
            filter.and_expression().as_deref(),
            Some("(created_at.gte.2024-06-01,created_at.lt.2024-07-01)")
        );
    }

    #[test]
    fn december_rolls_into_next_year() {
        let month: YearMonth = "2024-12".parse().unwrap();
        let filter = Filter::new().within_month("created_at", month);
        assert_eq!(
            filter.and_expression().as_deref(),
            Some("(created_at.gte.2024-12-01,created_at.lt.2025-01-01)")
        );
    }

    #[test]
    fn eq_predicate_and_query_pair() {
        let filter = Filter::new().equals("cartao", "C6");
        assert_eq!(filter.query_pairs(), vec![("and", "(cartao.eq.C6)".to_string())]);
    }

    #[test]
    fn values_with_grammar_characters_are_quoted() {
        let filter = Filter::new()
            .equals("cartao", "Santander Visa")
            .equals("descricao", "a,b")
            .equals("note", "say \"hi\"");
        assert_eq!(
            filter.and_expression().as_deref(),
            Some(r#"(cartao.eq."Santander Visa",descricao.eq."a,b",note.eq."say \"hi\"")"#)
        );
    }

    #[test]
    fn validate_rejects_odd_columns() {
        assert!(Filter::new().equals("valor", 1).validate().is_ok());
        assert!(Filter::new().equals("", 1).validate().is_err());
        assert!(Filter::new().equals("a.b", 1).validate().is_err());
    }
}
