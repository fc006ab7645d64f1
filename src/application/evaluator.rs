//! Maps an account-status snapshot to at most one blocking reason.
//!
//! Precedence lives in the rule tables below: the lock branch is chosen from
//! the status flags, then its table is scanned top to bottom and the first
//! rule whose validation code is present (and whose guard holds) wins.
//! Validation codes match by containment, see [`ValidationCode`].

use crate::domain::blocking::BlockingReason;
use crate::domain::cashier::CashierType;
use crate::domain::client::ClientProfile;
use crate::domain::ports::CurrencyCatalog;
use crate::domain::status::{AccountStatus, RiskClassification, StatusFlag, ValidationCode};
use chrono::{DateTime, Utc};

/// Facts about the client the rules depend on besides the status payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientFacts<'a> {
    pub currency: &'a str,
    pub is_crypto: bool,
    pub is_financial_account: bool,
    pub excluded_until: Option<DateTime<Utc>>,
}

impl<'a> ClientFacts<'a> {
    pub fn from_profile(
        client: &'a ClientProfile,
        currency: &'a str,
        catalog: &dyn CurrencyCatalog,
    ) -> Self {
        Self {
            currency,
            is_crypto: catalog.is_crypto(currency),
            is_financial_account: client.is_financial_account,
            excluded_until: client.excluded_until,
        }
    }
}

/// Extra condition a rule needs beyond its validation code being present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    Crypto,
    FinancialAccount,
    HighRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fixed(BlockingReason),
    /// Whole-cashier maintenance; the reason depends on the currency kind.
    CashierMaintenance,
    SelfExcluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub code: ValidationCode,
    pub guard: Guard,
    pub verdict: Verdict,
}

impl Rule {
    const fn fixed(code: ValidationCode, reason: BlockingReason) -> Self {
        Self::guarded(code, Guard::Always, reason)
    }

    const fn guarded(code: ValidationCode, guard: Guard, reason: BlockingReason) -> Self {
        Self {
            code,
            guard,
            verdict: Verdict::Fixed(reason),
        }
    }
}

pub const CASHIER_LOCKED_RULES: &[Rule] = &[
    Rule {
        code: ValidationCode::SystemMaintenance,
        guard: Guard::Always,
        verdict: Verdict::CashierMaintenance,
    },
    Rule::fixed(
        ValidationCode::FixDetails,
        BlockingReason::FixDetailsRequired { cashier_locked: true },
    ),
    Rule::fixed(ValidationCode::MaxTurnoverLimit, BlockingReason::LimitsExceeded),
    Rule::fixed(ValidationCode::FundsProtection, BlockingReason::ConsentRequired),
    Rule::fixed(
        ValidationCode::FinancialAssessment,
        BlockingReason::FinancialAssessmentRequired,
    ),
    Rule::fixed(ValidationCode::TaxInformation, BlockingReason::TinRequired),
    // Financial-account check precedes the high-risk check; first match wins.
    Rule::guarded(
        ValidationCode::Authenticate,
        Guard::FinancialAccount,
        BlockingReason::AuthenticateFinancial,
    ),
    Rule::guarded(
        ValidationCode::Authenticate,
        Guard::HighRisk,
        BlockingReason::AuthenticateHighRisk,
    ),
    Rule::fixed(ValidationCode::DocumentsExpired, BlockingReason::DocumentsExpired),
    Rule::fixed(
        ValidationCode::FinancialRiskApproval,
        BlockingReason::RiskApprovalRequired,
    ),
    Rule::fixed(ValidationCode::CashierLockedStatus, BlockingReason::CashierLocked),
];

pub const DEPOSIT_LOCKED_RULES: &[Rule] = &[
    Rule::guarded(
        ValidationCode::SystemMaintenance,
        Guard::Crypto,
        BlockingReason::MaintenanceDeposit { cashier_locked: false },
    ),
    Rule {
        code: ValidationCode::SelfExclusion,
        guard: Guard::Always,
        verdict: Verdict::SelfExcluded,
    },
    Rule::fixed(ValidationCode::UnwelcomeStatus, BlockingReason::Unwelcome),
];

pub const WITHDRAWAL_LOCKED_RULES: &[Rule] = &[
    Rule::guarded(
        ValidationCode::SystemMaintenance,
        Guard::Crypto,
        BlockingReason::MaintenanceWithdrawal { cashier_locked: false },
    ),
    Rule::fixed(
        ValidationCode::FixDetails,
        BlockingReason::FixDetailsRequired { cashier_locked: false },
    ),
    Rule::guarded(
        ValidationCode::Authenticate,
        Guard::HighRisk,
        BlockingReason::AuthenticateHighRisk,
    ),
    Rule::fixed(ValidationCode::WithdrawalLockedStatus, BlockingReason::DepositOnly),
    Rule::fixed(
        ValidationCode::NoWithdrawalOrTradingStatus,
        BlockingReason::DepositOnly,
    ),
];

/// Decides the single blocking reason for opening the cashier, if any.
///
/// A cashier-locked account always yields a reason from
/// [`CASHIER_LOCKED_RULES`] (or `LockedOther`) and nothing else is checked.
/// The deposit and withdrawal tables fall through to the currency check when
/// no rule matches.
pub fn evaluate(
    status: &AccountStatus,
    cashier_type: CashierType,
    client: &ClientFacts<'_>,
) -> Option<BlockingReason> {
    if status.has_flag(StatusFlag::CashierLocked) {
        return Some(
            first_match(CASHIER_LOCKED_RULES, status, cashier_type, client)
                .unwrap_or(BlockingReason::LockedOther),
        );
    }

    let branch = match cashier_type {
        CashierType::Deposit if status.has_flag(StatusFlag::DepositLocked) => DEPOSIT_LOCKED_RULES,
        CashierType::Withdraw if status.has_flag(StatusFlag::WithdrawalLocked) => {
            WITHDRAWAL_LOCKED_RULES
        }
        _ => &[],
    };

    first_match(branch, status, cashier_type, client)
        .or_else(|| currency_restriction(status, cashier_type, client.currency))
}

fn first_match(
    rules: &[Rule],
    status: &AccountStatus,
    cashier_type: CashierType,
    client: &ClientFacts<'_>,
) -> Option<BlockingReason> {
    rules
        .iter()
        .find(|rule| status.has_validation(rule.code) && guard_holds(rule.guard, status, client))
        .map(|rule| match rule.verdict {
            Verdict::Fixed(reason) => reason,
            Verdict::CashierMaintenance => match (client.is_crypto, cashier_type) {
                (false, _) => BlockingReason::MaintenanceCashier,
                (true, CashierType::Deposit) => {
                    BlockingReason::MaintenanceDeposit { cashier_locked: true }
                }
                (true, CashierType::Withdraw) => {
                    BlockingReason::MaintenanceWithdrawal { cashier_locked: true }
                }
            },
            Verdict::SelfExcluded => BlockingReason::SelfExcluded {
                until: client.excluded_until,
            },
        })
}

fn guard_holds(guard: Guard, status: &AccountStatus, client: &ClientFacts<'_>) -> bool {
    match guard {
        Guard::Always => true,
        Guard::Crypto => client.is_crypto,
        Guard::FinancialAccount => client.is_financial_account,
        Guard::HighRisk => status.risk_classification == RiskClassification::High,
    }
}

fn currency_restriction(
    status: &AccountStatus,
    cashier_type: CashierType,
    currency: &str,
) -> Option<BlockingReason> {
    let restrictions = status.restrictions_for(currency);
    let suspended = match cashier_type {
        CashierType::Deposit => restrictions.deposit_suspended,
        CashierType::Withdraw => restrictions.withdrawal_suspended,
    };
    suspended.then_some(BlockingReason::CurrencyRestricted)
}
