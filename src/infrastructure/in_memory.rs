use crate::domain::blocking::Notice;
use crate::domain::cashier::{
    ApiReply, CashierRequest, CashierResponse, ConsentSubmission, StatementEntry, TradingAccount,
    VerifyEmailRequest, WithdrawalLimits,
};
use crate::domain::ports::{CashierApi, CashierView, FieldLabels};
use crate::domain::status::AccountStatusResponse;
use crate::error::{CashierError, Result};
use crate::sync::lock;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::RwLock;

/// A scripted reply. `Err` carries the text of a transport failure.
pub type Scripted<T> = std::result::Result<T, String>;

/// Requests observed by [`ScriptedCashierApi`], in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ApiCall {
    Cashier { request: CashierRequest },
    AccountStatus,
    VerifyEmail { request: VerifyEmailRequest },
    Consent { submission: ConsentSubmission },
    Statement { limit: u32 },
    Mt5LoginList,
    Limits,
    WebsiteStatus,
    Settings,
}

#[derive(Debug)]
struct Script {
    cashier: VecDeque<Scripted<CashierResponse>>,
    account_status: Scripted<AccountStatusResponse>,
    verify_email: Scripted<ApiReply>,
    consent: Scripted<ApiReply>,
    statement: Scripted<Vec<StatementEntry>>,
    trading_accounts: Scripted<Vec<TradingAccount>>,
    limits: Scripted<WithdrawalLimits>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            cashier: VecDeque::new(),
            account_status: Ok(AccountStatusResponse {
                get_account_status: Some(Default::default()),
                error: None,
            }),
            verify_email: Ok(ApiReply::ok()),
            consent: Ok(ApiReply::ok()),
            statement: Ok(Vec::new()),
            trading_accounts: Ok(Vec::new()),
            limits: Ok(WithdrawalLimits::default()),
        }
    }
}

/// In-memory stand-in for the trading API transport.
///
/// Replies come from a script; every request is logged so tests can assert
/// on what was (or was not) sent. Cashier replies are consumed in order.
#[derive(Default, Clone)]
pub struct ScriptedCashierApi {
    script: Arc<RwLock<Script>>,
    calls: Arc<RwLock<Vec<ApiCall>>>,
    latency: Duration,
}

impl ScriptedCashierApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to every reply, letting tests overlap in-flight calls.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn push_cashier(&self, reply: Scripted<CashierResponse>) {
        self.script.write().await.cashier.push_back(reply);
    }

    pub async fn set_account_status(&self, reply: Scripted<AccountStatusResponse>) {
        self.script.write().await.account_status = reply;
    }

    pub async fn set_verify_email(&self, reply: Scripted<ApiReply>) {
        self.script.write().await.verify_email = reply;
    }

    pub async fn set_consent(&self, reply: Scripted<ApiReply>) {
        self.script.write().await.consent = reply;
    }

    pub async fn set_statement(&self, reply: Scripted<Vec<StatementEntry>>) {
        self.script.write().await.statement = reply;
    }

    pub async fn set_trading_accounts(&self, reply: Scripted<Vec<TradingAccount>>) {
        self.script.write().await.trading_accounts = reply;
    }

    pub async fn set_limits(&self, reply: Scripted<WithdrawalLimits>) {
        self.script.write().await.limits = reply;
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.read().await.clone()
    }

    pub async fn count(&self, matches: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.read().await.iter().filter(|call| matches(call)).count()
    }

    async fn record(&self, call: ApiCall) {
        self.calls.write().await.push(call);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn reply<T: Clone>(scripted: &Scripted<T>) -> Result<T> {
    scripted.clone().map_err(CashierError::Transport)
}

#[async_trait]
impl CashierApi for ScriptedCashierApi {
    async fn cashier(&self, request: &CashierRequest) -> Result<CashierResponse> {
        self.record(ApiCall::Cashier {
            request: request.clone(),
        })
        .await;
        let mut script = self.script.write().await;
        match script.cashier.pop_front() {
            Some(scripted) => scripted.map_err(CashierError::Transport),
            None => Err(CashierError::transport("no scripted cashier response")),
        }
    }

    async fn get_account_status(&self) -> Result<AccountStatusResponse> {
        self.record(ApiCall::AccountStatus).await;
        reply(&self.script.read().await.account_status)
    }

    async fn verify_email(&self, request: &VerifyEmailRequest) -> Result<ApiReply> {
        self.record(ApiCall::VerifyEmail {
            request: request.clone(),
        })
        .await;
        reply(&self.script.read().await.verify_email)
    }

    async fn submit_consent(&self, submission: &ConsentSubmission) -> Result<ApiReply> {
        self.record(ApiCall::Consent {
            submission: *submission,
        })
        .await;
        reply(&self.script.read().await.consent)
    }

    async fn statement(&self, limit: u32) -> Result<Vec<StatementEntry>> {
        self.record(ApiCall::Statement { limit }).await;
        reply(&self.script.read().await.statement)
    }

    async fn mt5_login_list(&self) -> Result<Vec<TradingAccount>> {
        self.record(ApiCall::Mt5LoginList).await;
        reply(&self.script.read().await.trading_accounts)
    }

    async fn get_limits(&self) -> Result<WithdrawalLimits> {
        self.record(ApiCall::Limits).await;
        reply(&self.script.read().await.limits)
    }

    async fn wait_website_status(&self) -> Result<()> {
        self.record(ApiCall::WebsiteStatus).await;
        Ok(())
    }

    async fn wait_settings(&self) -> Result<()> {
        self.record(ApiCall::Settings).await;
        Ok(())
    }
}

/// Everything the gate asked the page to do, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewEvent {
    Notice { notice: Notice },
    ConsentForm,
    ConsentFormHidden,
    CodeEntry,
    Embedded { url: String, height: Option<u32> },
    FrameHeight { height: u32 },
    LoadingHidden,
    Redirect { target: String },
    StatusRefreshed,
}

/// A page that records instead of rendering.
#[derive(Default, Clone)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
    verification_code: Option<String>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Code the simulated user types when code entry is shown.
    pub fn with_verification_code(mut self, code: impl Into<String>) -> Self {
        self.verification_code = Some(code.into());
        self
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.lock().clone()
    }

    pub fn last_notice(&self) -> Option<Notice> {
        self.lock().iter().rev().find_map(|event| match event {
            ViewEvent::Notice { notice } => Some(notice.clone()),
            _ => None,
        })
    }

    /// Current height of the embedded frame, if one was embedded.
    pub fn frame_height(&self) -> Option<u32> {
        self.lock().iter().rev().find_map(|event| match event {
            ViewEvent::FrameHeight { height } => Some(*height),
            ViewEvent::Embedded { height, .. } => *height,
            _ => None,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ViewEvent>> {
        lock(&self.events)
    }

    fn push(&self, event: ViewEvent) {
        self.lock().push(event);
    }
}

#[async_trait]
impl CashierView for RecordingView {
    fn show_notice(&self, notice: &Notice) {
        self.push(ViewEvent::Notice {
            notice: notice.clone(),
        });
    }

    fn show_consent_form(&self) {
        self.push(ViewEvent::ConsentForm);
    }

    fn hide_consent_form(&self) {
        self.push(ViewEvent::ConsentFormHidden);
    }

    fn show_code_entry(&self) {
        self.push(ViewEvent::CodeEntry);
    }

    async fn verification_code(&self) -> Option<String> {
        self.verification_code.clone()
    }

    fn embed_frame(&self, url: &str, height: Option<u32>) {
        self.push(ViewEvent::Embedded {
            url: url.to_string(),
            height,
        });
    }

    fn set_frame_height(&self, height: u32) {
        self.push(ViewEvent::FrameHeight { height });
    }

    fn hide_loading(&self) {
        self.push(ViewEvent::LoadingHidden);
    }

    fn redirect(&self, target: &str) {
        self.push(ViewEvent::Redirect {
            target: target.to_string(),
        });
    }

    fn refresh_account_status(&self) {
        self.push(ViewEvent::StatusRefreshed);
    }
}

/// Field labels from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticFieldLabels {
    labels: HashMap<String, String>,
}

impl StaticFieldLabels {
    pub fn english() -> Self {
        let labels = [
            ("address_city", "Town/City"),
            ("address_line_1", "First line of home address"),
            ("address_postcode", "Postal Code/ZIP"),
            ("address_state", "State/Province"),
            ("email", "Email address"),
            ("phone", "Telephone"),
            ("residence", "Country of Residence"),
        ]
        .into_iter()
        .map(|(field, label)| (field.to_string(), label.to_string()))
        .collect();
        Self { labels }
    }
}

impl FieldLabels for StaticFieldLabels {
    fn label(&self, field: &str) -> Option<String> {
        self.labels.get(field).cloned()
    }
}
