use crate::domain::blocking::CannedMessage;
use crate::domain::cashier::{ApiError, CashierErrorCode, CashierResponse};
use crate::domain::ports::FieldLabelsRef;
use crate::error::CashierError;
use serde::Serialize;

/// What the page does with a cashier (or consent) response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum Action {
    RetryVerification,
    ShowConsentFlow,
    ShowCanned(CannedMessage),
    ShowCustom(String),
    Embed(String),
}

/// Maps cashier responses to page actions. Unknown error codes fall back to
/// the server's own message.
pub struct ResponseRouter {
    labels: FieldLabelsRef,
}

impl ResponseRouter {
    pub fn new(labels: FieldLabelsRef) -> Self {
        Self { labels }
    }

    pub fn route(&self, response: &CashierResponse) -> Action {
        match response {
            CashierResponse::Url(url) => Action::Embed(url.clone()),
            CashierResponse::Failure(error) => self.route_error(error),
        }
    }

    pub fn route_error(&self, error: &ApiError) -> Action {
        match &error.code {
            CashierErrorCode::EmailVerify => Action::RetryVerification,
            CashierErrorCode::TncApproval => Action::ShowCanned(CannedMessage::TncApproval),
            CashierErrorCode::FixDetails => {
                Action::ShowCustom(self.personal_details_message(error.field_ids()))
            }
            CashierErrorCode::FundsProtection => Action::ShowConsentFlow,
            CashierErrorCode::Authenticate => Action::ShowCanned(CannedMessage::NotAuthenticated),
            CashierErrorCode::FinancialRiskApproval => {
                Action::ShowCanned(CannedMessage::FinancialRisk)
            }
            CashierErrorCode::AgeVerification => Action::ShowCanned(CannedMessage::AgeVerification),
            CashierErrorCode::MaxTurnoverLimit => {
                Action::ShowCanned(CannedMessage::SelfExclusionLimits)
            }
            CashierErrorCode::Other(_) => Action::ShowCustom(error.message.clone()),
        }
    }

    /// A transport failure on the cashier request is shown like an unknown
    /// server error.
    pub fn route_transport_error(&self, error: &CashierError) -> Action {
        Action::ShowCustom(error.to_string())
    }

    fn personal_details_message(&self, fields: Option<&[String]>) -> String {
        let listed = match fields {
            Some(fields) if !fields.is_empty() => fields
                .iter()
                .map(|field| self.labels.label(field).unwrap_or_else(|| field.clone()))
                .collect::<Vec<_>>()
                .join(", "),
            _ => "details".to_string(),
        };
        format!("Please update your {listed} in your personal details to access the cashier.")
    }
}
