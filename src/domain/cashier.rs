use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashierType {
    Deposit,
    Withdraw,
}

impl CashierType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }

    /// Parses a page `action` value. Only exact matches are accepted.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "deposit" => Some(Self::Deposit),
            "withdraw" => Some(Self::Withdraw),
            _ => None,
        }
    }
}

impl fmt::Display for CashierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An email verification token, either taken from the page URL or typed in
/// by the user after requesting a verification email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VerificationToken(String);

impl VerificationToken {
    pub const LENGTH: usize = 8;

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Format check only; the server is the authority on whether the token
    /// is still accepted.
    pub fn is_well_formed(&self) -> bool {
        self.0.trim().chars().count() == Self::LENGTH
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashierRequest {
    #[serde(rename = "cashier")]
    pub cashier_type: CashierType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<VerificationToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Error codes returned by the cashier and consent endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CashierErrorCode {
    EmailVerify,
    TncApproval,
    FixDetails,
    FundsProtection,
    Authenticate,
    FinancialRiskApproval,
    AgeVerification,
    MaxTurnoverLimit,
    Other(String),
}

impl From<String> for CashierErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "ASK_EMAIL_VERIFY" => Self::EmailVerify,
            "ASK_TNC_APPROVAL" => Self::TncApproval,
            "ASK_FIX_DETAILS" => Self::FixDetails,
            "ASK_UK_FUNDS_PROTECTION" => Self::FundsProtection,
            "ASK_AUTHENTICATE" => Self::Authenticate,
            "ASK_FINANCIAL_RISK_APPROVAL" => Self::FinancialRiskApproval,
            "ASK_AGE_VERIFICATION" => Self::AgeVerification,
            "ASK_SELF_EXCLUSION_MAX_TURNOVER_SET" => Self::MaxTurnoverLimit,
            _ => Self::Other(code),
        }
    }
}

impl From<&str> for CashierErrorCode {
    fn from(code: &str) -> Self {
        Self::from(code.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ErrorDetails {
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

/// Structured `{code, message}` error sent by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub code: CashierErrorCode,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub details: Option<ErrorDetails>,
}

impl ApiError {
    pub fn new(code: impl Into<CashierErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            fields: None,
            details: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Invalid profile fields, whether sent flat or nested under `details`.
    pub fn field_ids(&self) -> Option<&[String]> {
        self.fields
            .as_deref()
            .or_else(|| self.details.as_ref().and_then(|d| d.fields.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
struct RawCashierResponse {
    #[serde(default)]
    cashier: Option<String>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCashierResponse")]
pub enum CashierResponse {
    Url(String),
    Failure(ApiError),
}

impl TryFrom<RawCashierResponse> for CashierResponse {
    type Error = String;

    fn try_from(raw: RawCashierResponse) -> Result<Self, Self::Error> {
        match (raw.error, raw.cashier) {
            (Some(error), _) => Ok(Self::Failure(error)),
            (None, Some(url)) => Ok(Self::Url(url)),
            (None, None) => Err("cashier response carries neither `cashier` nor `error`".to_string()),
        }
    }
}

/// Generic `{}` or `{error}` reply used by the email and consent endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ApiReply {
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl ApiReply {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failed(error: ApiError) -> Self {
        Self { error: Some(error) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyEmailRequest {
    pub verify_email: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl VerifyEmailRequest {
    pub fn payment_withdraw(email: impl Into<String>) -> Self {
        Self {
            verify_email: email.into(),
            kind: "payment_withdraw".to_string(),
        }
    }
}

/// The two acknowledgements captured by the funds-protection consent form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsentSubmission {
    pub ukgc_funds_protection: u8,
    pub tnc_approval: u8,
}

/// A message posted to the page by the embedded provider frame, or by
/// anything else able to post to the window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrameHeightMessage {
    pub origin: String,
    #[serde(default)]
    pub data: String,
}

impl FrameHeightMessage {
    pub fn new(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: data.into(),
        }
    }
}

/// One row of the account statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatementEntry {
    #[serde(default)]
    pub transaction_id: Option<u64>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradingAccount {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WithdrawalLimits {
    #[serde(default)]
    pub remainder: Option<Decimal>,
}
