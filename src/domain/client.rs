use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// The authenticated user as seen by the cashier page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientProfile {
    pub email: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub balance: Decimal,
    /// Whether the account is of the financial (MF) type.
    #[serde(default)]
    pub is_financial_account: bool,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub excluded_until: Option<DateTime<Utc>>,
    /// Running inside the native host application rather than a browser.
    #[serde(default)]
    pub host_app: bool,
}

impl ClientProfile {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            currency: None,
            balance: Decimal::ZERO,
            is_financial_account: false,
            excluded_until: None,
            host_app: false,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    /// The selected currency, treating an empty code as unselected.
    pub fn selected_currency(&self) -> Option<&str> {
        self.currency.as_deref().filter(|code| !code.is_empty())
    }

    pub fn has_no_balance(&self) -> bool {
        self.balance.is_zero()
    }
}
