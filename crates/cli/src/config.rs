use finboard_core::session::{SessionContext, UserInfo};
use rust_decimal::Decimal;

/// A dashboard setting that is present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a decimal amount, got '{value}'")]
    InvalidAmount { name: &'static str, value: String },

    #[error("{name} must not be negative")]
    NegativeAmount { name: &'static str },

    #[error("FINBOARD_USER_NAME and FINBOARD_USER_EMAIL must be set together")]
    PartialUser,
}

/// Report settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Monthly budget for daily expenses.
    pub expense_limit: Decimal,
    /// Contract value of the apartment after delivery.
    pub contract_total: Decimal,
    /// Amount already paid against the contract.
    pub contract_paid: Decimal,
    /// Identity handed over by the login provider, if any.
    pub user: Option<UserInfo>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            expense_limit: Decimal::from(1_000),
            contract_total: Decimal::from(503_000),
            contract_paid: Decimal::from(96_000),
            user: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default     |
    /// |----------------------------|-------------|
    /// | `FINBOARD_EXPENSE_LIMIT`   | `1000`      |
    /// | `APARTMENT_CONTRACT_TOTAL` | `503000`    |
    /// | `APARTMENT_CONTRACT_PAID`  | `96000`     |
    /// | `FINBOARD_USER_NAME`       | anonymous   |
    /// | `FINBOARD_USER_EMAIL`      | anonymous   |
    /// | `FINBOARD_USER_PICTURE`    | none        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`DashboardConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let amount = |name: &'static str, default: Decimal| -> Result<Decimal, ConfigError> {
            let Some(raw) = var(name) else {
                return Ok(default);
            };
            let value: Decimal = raw
                .parse()
                .map_err(|_| ConfigError::InvalidAmount {
                    name,
                    value: raw.clone(),
                })?;
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ConfigError::NegativeAmount { name });
            }
            Ok(value)
        };

        let user = match (var("FINBOARD_USER_NAME"), var("FINBOARD_USER_EMAIL")) {
            (Some(name), Some(email)) => Some(UserInfo {
                name,
                email,
                picture: var("FINBOARD_USER_PICTURE"),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialUser),
        };

        Ok(Self {
            expense_limit: amount("FINBOARD_EXPENSE_LIMIT", defaults.expense_limit)?,
            contract_total: amount("APARTMENT_CONTRACT_TOTAL", defaults.contract_total)?,
            contract_paid: amount("APARTMENT_CONTRACT_PAID", defaults.contract_paid)?,
            user,
        })
    }

    /// A session logged in as the configured user, or an anonymous one.
    pub fn session(&self) -> SessionContext {
        let mut session = SessionContext::anonymous();
        if let Some(user) = &self.user {
            session.login(user.clone());
        }
        session
    }
}
