use super::blocking::Notice;
use super::cashier::{
    ApiReply, CashierRequest, CashierResponse, ConsentSubmission, StatementEntry, TradingAccount,
    VerifyEmailRequest, WithdrawalLimits,
};
use super::status::AccountStatusResponse;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Request/response transport to the trading API.
///
/// `Err` is reserved for transport failures. Structured API errors arrive
/// inside the `Ok` payloads.
#[async_trait]
pub trait CashierApi: Send + Sync {
    async fn cashier(&self, request: &CashierRequest) -> Result<CashierResponse>;
    async fn get_account_status(&self) -> Result<AccountStatusResponse>;
    async fn verify_email(&self, request: &VerifyEmailRequest) -> Result<ApiReply>;
    async fn submit_consent(&self, submission: &ConsentSubmission) -> Result<ApiReply>;
    async fn statement(&self, limit: u32) -> Result<Vec<StatementEntry>>;
    async fn mt5_login_list(&self) -> Result<Vec<TradingAccount>>;
    async fn get_limits(&self) -> Result<WithdrawalLimits>;
    /// Resolves once the website status has been received.
    async fn wait_website_status(&self) -> Result<()>;
    /// Resolves once the account settings have been received.
    async fn wait_settings(&self) -> Result<()>;
}

/// The page the gate drives. Implementations only render; they never decide.
#[async_trait]
pub trait CashierView: Send + Sync {
    /// Replaces whatever notice is visible with this one. The consent form
    /// is hidden separately through `hide_consent_form`.
    fn show_notice(&self, notice: &Notice);
    fn show_consent_form(&self);
    fn hide_consent_form(&self);
    fn show_code_entry(&self);
    /// Waits for the user to type a verification code. `None` when the
    /// entry was dismissed.
    async fn verification_code(&self) -> Option<String>;
    fn embed_frame(&self, url: &str, height: Option<u32>);
    fn set_frame_height(&self, height: u32);
    fn hide_loading(&self);
    fn redirect(&self, target: &str);
    fn refresh_account_status(&self);
}

/// Display labels for profile field identifiers.
pub trait FieldLabels: Send + Sync {
    fn label(&self, field: &str) -> Option<String>;
}

pub trait CurrencyCatalog: Send + Sync {
    fn is_crypto(&self, currency: &str) -> bool;
    fn min_withdrawal(&self, currency: &str) -> Decimal;
}

pub type CashierApiRef = Arc<dyn CashierApi>;
pub type CashierViewRef = Arc<dyn CashierView>;
pub type FieldLabelsRef = Arc<dyn FieldLabels>;
pub type CurrencyCatalogRef = Arc<dyn CurrencyCatalog>;
