use serde::Deserialize;
use std::collections::HashMap;

/// Account-level lock flags reported in the `status` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFlag {
    CashierLocked,
    DepositLocked,
    WithdrawalLocked,
}

impl StatusFlag {
    pub fn marker(self) -> &'static str {
        match self {
            Self::CashierLocked => "cashier_locked",
            Self::DepositLocked => "deposit_locked",
            Self::WithdrawalLocked => "withdrawal_locked",
        }
    }
}

/// The closed set of cashier validation tags the evaluator understands.
///
/// Matching is by containment: a tag matches a raw entry when the entry
/// contains the tag's marker anywhere. Entries may be composite strings, so
/// exact comparison would miss codes the server bundles together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    SystemMaintenance,
    FixDetails,
    MaxTurnoverLimit,
    FundsProtection,
    FinancialAssessment,
    TaxInformation,
    Authenticate,
    DocumentsExpired,
    FinancialRiskApproval,
    CashierLockedStatus,
    SelfExclusion,
    UnwelcomeStatus,
    WithdrawalLockedStatus,
    NoWithdrawalOrTradingStatus,
}

impl ValidationCode {
    pub fn marker(self) -> &'static str {
        match self {
            Self::SystemMaintenance => "system_maintenance",
            Self::FixDetails => "ASK_FIX_DETAILS",
            Self::MaxTurnoverLimit => "ASK_SELF_EXCLUSION_MAX_TURNOVER_SET",
            Self::FundsProtection => "ASK_UK_FUNDS_PROTECTION",
            Self::FinancialAssessment => "FinancialAssessmentRequired",
            Self::TaxInformation => "ASK_TIN_INFORMATION",
            Self::Authenticate => "ASK_AUTHENTICATE",
            Self::DocumentsExpired => "documents_expired",
            Self::FinancialRiskApproval => "ASK_FINANCIAL_RISK_APPROVAL",
            Self::CashierLockedStatus => "cashier_locked_status",
            Self::SelfExclusion => "SelfExclusion",
            Self::UnwelcomeStatus => "unwelcome_status",
            Self::WithdrawalLockedStatus => "withdrawal_locked_status",
            Self::NoWithdrawalOrTradingStatus => "no_withdrawal_or_trading_status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskClassification {
    Low,
    #[default]
    Standard,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct CurrencyRestrictions {
    #[serde(default, rename = "is_deposit_suspended", deserialize_with = "flag")]
    pub deposit_suspended: bool,
    #[serde(default, rename = "is_withdrawal_suspended", deserialize_with = "flag")]
    pub withdrawal_suspended: bool,
}

/// Accepts both JSON booleans and the 0/1 integers the API sends.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(value) => value,
        Raw::Int(value) => value != 0,
    })
}

/// Snapshot of the account's cashier status, fetched once per page activation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AccountStatus {
    #[serde(default, rename = "status")]
    pub status_flags: Vec<String>,
    #[serde(default)]
    pub cashier_validation: Vec<String>,
    #[serde(default)]
    pub risk_classification: RiskClassification,
    #[serde(default)]
    pub currency_config: HashMap<String, CurrencyRestrictions>,
}

impl AccountStatus {
    pub fn has_flag(&self, flag: StatusFlag) -> bool {
        self.status_flags
            .iter()
            .any(|raw| raw.contains(flag.marker()))
    }

    pub fn has_validation(&self, code: ValidationCode) -> bool {
        self.cashier_validation
            .iter()
            .any(|raw| raw.contains(code.marker()))
    }

    pub fn restrictions_for(&self, currency: &str) -> CurrencyRestrictions {
        self.currency_config
            .get(currency)
            .copied()
            .unwrap_or_default()
    }
}

/// Raw `get_account_status` reply. A present `error` makes the status check
/// inconclusive rather than fatal.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AccountStatusResponse {
    #[serde(default)]
    pub get_account_status: Option<AccountStatus>,
    #[serde(default)]
    pub error: Option<crate::domain::cashier::ApiError>,
}

impl AccountStatusResponse {
    pub fn conclusive(&self) -> Option<&AccountStatus> {
        match self.error {
            Some(_) => None,
            None => self.get_account_status.as_ref(),
        }
    }
}
