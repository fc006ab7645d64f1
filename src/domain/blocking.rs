use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a notice is displayed. Only one notice is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Errors,
    Messages,
}

/// A rendered message state: a message id from the page template, with
/// optional text replacing the template's default content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub surface: Surface,
    pub id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Notice {
    pub fn error(id: &'static str) -> Self {
        Self {
            surface: Surface::Errors,
            id,
            text: None,
        }
    }

    pub fn message(id: &'static str) -> Self {
        Self {
            surface: Surface::Messages,
            id,
            text: None,
        }
    }

    pub fn custom_error(text: impl Into<String>) -> Self {
        Self {
            surface: Surface::Errors,
            id: "custom_error",
            text: Some(text.into()),
        }
    }
}

/// Why the cashier cannot be opened. Blocking reasons are expected,
/// user-actionable states, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockingReason {
    MaintenanceCashier,
    MaintenanceDeposit { cashier_locked: bool },
    MaintenanceWithdrawal { cashier_locked: bool },
    FixDetailsRequired { cashier_locked: bool },
    LimitsExceeded,
    ConsentRequired,
    FinancialAssessmentRequired,
    TinRequired,
    AuthenticateFinancial,
    AuthenticateHighRisk,
    DocumentsExpired,
    RiskApprovalRequired,
    CashierLocked,
    LockedOther,
    SelfExcluded { until: Option<DateTime<Utc>> },
    Unwelcome,
    /// Deposits refused while withdrawals stay open. No status rule yields
    /// it today; `Unwelcome` is the status-driven form of the same block.
    WithdrawalOnly,
    DepositOnly,
    CurrencyRestricted,
    WithdrawalLimitReached,
    NoBalance,
    NoCurrencySelected,
}

impl BlockingReason {
    /// Renders the reason into the single notice the page should show.
    ///
    /// Returns `None` for reasons surfaced by other means: the consent form
    /// for `ConsentRequired` and the currency-selection redirect for
    /// `NoCurrencySelected`.
    pub fn notice(&self) -> Option<Notice> {
        let notice = match self {
            Self::MaintenanceCashier => Notice::custom_error(
                "Our cashier is temporarily down due to system maintenance. You can access the Cashier in a few minutes when the maintenance is complete.",
            ),
            Self::MaintenanceDeposit { cashier_locked: true }
            | Self::MaintenanceWithdrawal { cashier_locked: true } => Notice::custom_error(
                "Our cryptocurrency cashier is temporarily down due to system maintenance. You can access the Cashier in a few minutes when the maintenance is complete.",
            ),
            Self::MaintenanceDeposit { cashier_locked: false } => Notice::custom_error(
                "Deposits are temporarily unavailable due to system maintenance. You can make your deposits when the maintenance is complete.",
            ),
            Self::MaintenanceWithdrawal { cashier_locked: false } => Notice::custom_error(
                "Withdrawals are temporarily unavailable due to system maintenance. You can make your withdrawals when the maintenance is complete.",
            ),
            Self::FixDetailsRequired { cashier_locked: true } => {
                Notice::message("cashier_personal_details_message")
            }
            Self::FixDetailsRequired { cashier_locked: false } => {
                Notice::message("withdrawal_personal_details_message")
            }
            Self::LimitsExceeded => Notice::error("limits_error"),
            Self::FinancialAssessmentRequired => Notice::error("fa_error"),
            Self::TinRequired => Notice::error("tin_error"),
            Self::AuthenticateFinancial => Notice::message("not_authenticated_message"),
            Self::AuthenticateHighRisk => Notice::message("high_risk_not_authenticated_message"),
            Self::DocumentsExpired => Notice::custom_error(
                "The identification documents you submitted have expired. Please submit valid identity documents to unlock Cashier.",
            ),
            Self::RiskApprovalRequired => {
                Notice::custom_error("Please complete the Appropriateness Test to access your cashier.")
            }
            Self::CashierLocked => Notice::custom_error(
                "Your cashier is currently locked. Please contact us via live chat to find out how to unlock it.",
            ),
            Self::LockedOther => Notice::custom_error("Your cashier is locked."),
            Self::SelfExcluded { until } => Notice::custom_error(format!(
                "You have chosen to exclude yourself from trading on our website until {}. If you are unable to place a trade or deposit after your self-exclusion period, please contact us via live chat.",
                until
                    .map(|at| at.format("%d %b %Y").to_string())
                    .unwrap_or_else(|| "further notice".to_string())
            )),
            Self::Unwelcome | Self::WithdrawalOnly => Notice::custom_error(
                "Unfortunately, you can only make withdrawals. Please contact us via live chat.",
            ),
            Self::DepositOnly => Notice::custom_error(
                "Unfortunately, you can only make deposits. Please contact us via live chat to enable withdrawals.",
            ),
            Self::CurrencyRestricted => Notice::custom_error(
                "Please note that the selected currency is allowed for limited accounts only.",
            ),
            Self::WithdrawalLimitReached => Notice::custom_error(
                "You have reached the withdrawal limit. Please upload your proof of identity and address to lift your withdrawal limit and proceed with your withdrawal.",
            ),
            Self::NoBalance => Notice::error("no_balance_error"),
            Self::ConsentRequired | Self::NoCurrencySelected => return None,
        };
        Some(notice)
    }
}

/// Fixed messages the response router can surface without server text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CannedMessage {
    TncApproval,
    NotAuthenticated,
    FinancialRisk,
    AgeVerification,
    SelfExclusionLimits,
}

impl CannedMessage {
    pub fn notice(self) -> Notice {
        match self {
            Self::TncApproval => Notice::error("tnc_error"),
            Self::NotAuthenticated => Notice::message("not_authenticated_message"),
            Self::FinancialRisk => Notice::error("financial_risk_error"),
            Self::AgeVerification => Notice::error("age_error"),
            Self::SelfExclusionLimits => Notice::error("limits_error"),
        }
    }
}
