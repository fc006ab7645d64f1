use crate::application::consent::ConsentForm;
use crate::application::evaluator::{self, ClientFacts};
use crate::application::router::{Action, ResponseRouter};
use crate::application::session::{CashierSession, EmbeddedFrame};
use crate::application::verification::{VerificationFlow, VerificationOutcome, VerificationState};
use crate::config::GateConfig;
use crate::domain::blocking::{BlockingReason, Notice};
use crate::domain::cashier::{
    ApiReply, CashierRequest, CashierType, FrameHeightMessage, StatementEntry, VerificationToken,
};
use crate::domain::client::ClientProfile;
use crate::domain::location::PageLocation;
use crate::domain::ports::{CashierApiRef, CashierViewRef, CurrencyCatalogRef, FieldLabelsRef};
use crate::error::{CashierError, Result};
use crate::sync::lock;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Shared "this page activation is over" flag. Results that arrive after
/// disposal are dropped instead of touching the page.
#[derive(Debug, Clone, Default)]
pub struct FlowGuard(Arc<AtomicBool>);

impl FlowGuard {
    pub fn dispose(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    CurrencyCheck,
    BalanceCheck,
    AccountStatusCheck,
    SupplementaryChecks,
    SettingsReady,
    CashierRequest,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    Blocked { reason: BlockingReason },
    /// The consent form is on screen; see [`SessionGate::submit_consent`].
    ConsentPending,
    Notice { notice: Notice },
    Embedded { frame: EmbeddedFrame },
    VerificationCancelled,
    /// The flow was torn down while a call was in flight.
    Abandoned,
}

/// Data fetched purely to prime later UI. Missing entries mean the lookup
/// was skipped or failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplementaryData {
    pub recent_transaction: Option<StatementEntry>,
    pub trading_accounts: Option<usize>,
    pub withdrawal_remainder: Option<Decimal>,
}

/// The collaborators a gate is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub api: CashierApiRef,
    pub view: CashierViewRef,
    pub labels: FieldLabelsRef,
    pub currencies: CurrencyCatalogRef,
}

enum Settled {
    Done(GateOutcome),
    Reverify,
}

/// Orchestrates one cashier page activation.
///
/// Stages run strictly in order and the first blocking stage ends the flow:
///
/// ```text
/// CurrencyCheck → BalanceCheck → AccountStatusCheck → SupplementaryChecks
///     → SettingsReady → CashierRequest → Terminal
/// ```
pub struct SessionGate {
    config: GateConfig,
    client: ClientProfile,
    location: PageLocation,
    cashier_type: CashierType,
    api: CashierApiRef,
    view: CashierViewRef,
    currencies: CurrencyCatalogRef,
    router: ResponseRouter,
    verification: VerificationFlow,
    session: CashierSession,
    guard: FlowGuard,
    /// Set while the consent form is on screen; a submission consumes it.
    consent_pending: AtomicBool,
    stage: Mutex<Stage>,
    supplementary: Mutex<SupplementaryData>,
}

impl SessionGate {
    pub fn new(
        config: GateConfig,
        client: ClientProfile,
        location: PageLocation,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let cashier_type = location
            .cashier_type()
            .ok_or_else(|| CashierError::UnknownCashierAction(location.action().unwrap_or_default()))?;
        let Collaborators {
            api,
            view,
            labels,
            currencies,
        } = collaborators;
        let guard = FlowGuard::default();

        let verification = VerificationFlow::new(
            api.clone(),
            view.clone(),
            client.email.clone(),
            client.host_app,
            location.token(),
        );
        let session = CashierSession::new(
            api.clone(),
            view.clone(),
            guard.clone(),
            config.site_domain.clone(),
            config.default_frame_height,
            config.loading_grace(),
        );

        Ok(Self {
            config,
            client,
            location,
            cashier_type,
            api,
            view,
            currencies,
            router: ResponseRouter::new(labels),
            verification,
            session,
            guard,
            consent_pending: AtomicBool::new(false),
            stage: Mutex::new(Stage::Init),
            supplementary: Mutex::new(SupplementaryData::default()),
        })
    }

    pub fn cashier_type(&self) -> CashierType {
        self.cashier_type
    }

    pub fn stage(&self) -> Stage {
        *lock(&self.stage)
    }

    pub fn supplementary(&self) -> SupplementaryData {
        lock(&self.supplementary).clone()
    }

    pub fn verification_state(&self) -> VerificationState {
        self.verification.state()
    }

    pub fn frame(&self) -> Option<EmbeddedFrame> {
        self.session.frame()
    }

    pub fn is_disposed(&self) -> bool {
        self.guard.is_disposed()
    }

    /// Runs the page activation to its first terminal state.
    pub async fn run(&self) -> GateOutcome {
        self.enter(Stage::CurrencyCheck);
        let Some(currency) = self.client.selected_currency() else {
            return self.block(BlockingReason::NoCurrencySelected);
        };

        self.enter(Stage::BalanceCheck);
        if self.cashier_type == CashierType::Withdraw && self.client.has_no_balance() {
            return self.block(BlockingReason::NoBalance);
        }

        self.enter(Stage::AccountStatusCheck);
        let response = self.api.get_account_status().await;
        if self.is_disposed() {
            return GateOutcome::Abandoned;
        }
        match response.as_ref().map(|response| response.conclusive()) {
            Ok(Some(status)) => {
                let facts = ClientFacts::from_profile(&self.client, currency, self.currencies.as_ref());
                if let Some(reason) = evaluator::evaluate(status, self.cashier_type, &facts) {
                    return self.block(reason);
                }
            }
            Ok(None) => warn!("account status carried an error, continuing without it"),
            Err(err) => warn!(error = %err, "account status unavailable, continuing without it"),
        }

        self.enter(Stage::SupplementaryChecks);
        if let Err(err) = self.api.wait_website_status().await {
            warn!(error = %err, "website status unavailable");
        }
        let data = self.supplementary_checks().await;
        if self.is_disposed() {
            return GateOutcome::Abandoned;
        }

        self.enter(Stage::SettingsReady);
        if self.cashier_type == CashierType::Withdraw
            && let Some(remainder) = data.withdrawal_remainder
            && remainder < self.currencies.min_withdrawal(currency)
        {
            self.refresh_status_in_background();
            return self.block(BlockingReason::WithdrawalLimitReached);
        }
        if let Err(err) = self.api.wait_settings().await {
            warn!(error = %err, "account settings unavailable");
        }
        if self.is_disposed() {
            return GateOutcome::Abandoned;
        }

        self.enter(Stage::CashierRequest);
        let token = match self.cashier_type {
            CashierType::Deposit => None,
            CashierType::Withdraw => match self.verify().await {
                Ok(token) => Some(token),
                Err(outcome) => return outcome,
            },
        };
        self.cashier_request(token).await
    }

    /// Submits the consent form and, once accepted, asks for the cashier
    /// URL again.
    ///
    /// Only valid while the form is on screen; each showing of the form
    /// accepts a single submission.
    pub async fn submit_consent(&self, form: ConsentForm) -> Result<GateOutcome> {
        if self.is_disposed() {
            return Ok(GateOutcome::Abandoned);
        }
        let submission = form.submission()?;
        if !self.consent_pending.swap(false, Ordering::SeqCst) {
            return Err(CashierError::ConsentNotRequested);
        }
        let reply = self.api.submit_consent(&submission).await;
        if self.is_disposed() {
            return Ok(GateOutcome::Abandoned);
        }
        self.view.hide_consent_form();

        let action = match reply {
            Ok(ApiReply { error: None }) => {
                info!("consent accepted");
                self.enter(Stage::CashierRequest);
                return Ok(self.cashier_request(self.current_token()).await);
            }
            Ok(ApiReply { error: Some(error) }) => self.router.route_error(&error),
            Err(err) => self.router.route_transport_error(&err),
        };
        Ok(match self.settle(action) {
            Settled::Done(outcome) => outcome,
            Settled::Reverify => match self.verify().await {
                Ok(token) => self.cashier_request(Some(token)).await,
                Err(outcome) => outcome,
            },
        })
    }

    /// Delivers a cross-window message to the embedded frame.
    pub fn on_frame_message(&self, message: &FrameHeightMessage) -> Option<u32> {
        self.session.on_message(message)
    }

    /// Ends the page activation: stops listening for height messages and
    /// forgets the cached verification email.
    pub fn teardown(&self) {
        self.guard.dispose();
        self.session.remove_listener();
        self.verification.reset();
        info!("cashier flow torn down");
    }

    async fn supplementary_checks(&self) -> SupplementaryData {
        let mut data = SupplementaryData::default();
        match self.cashier_type {
            CashierType::Deposit if self.client.has_no_balance() => {
                let (statement, accounts) =
                    tokio::join!(self.api.statement(1), self.api.mt5_login_list());
                data.recent_transaction =
                    settled("statement", statement).and_then(|rows| rows.into_iter().next());
                data.trading_accounts = settled("mt5_login_list", accounts).map(|list| list.len());
            }
            CashierType::Deposit => {}
            CashierType::Withdraw => {
                data.withdrawal_remainder =
                    settled("get_limits", self.api.get_limits().await).and_then(|l| l.remainder);
            }
        }
        *lock(&self.supplementary) = data.clone();
        data
    }

    async fn cashier_request(&self, mut token: Option<VerificationToken>) -> GateOutcome {
        loop {
            let request = CashierRequest {
                cashier_type: self.cashier_type,
                verification_code: token.clone(),
                provider: self.location.provider(&self.config.provider_markers),
            };
            let response = self.session.request(&request).await;
            if self.is_disposed() {
                return GateOutcome::Abandoned;
            }

            let action = match &response {
                Ok(response) => self.router.route(response),
                Err(err) => {
                    warn!(error = %err, "cashier request failed");
                    self.router.route_transport_error(err)
                }
            };
            match self.settle(action) {
                Settled::Done(outcome) => return outcome,
                Settled::Reverify => {
                    if let Some(rejected) = token.take() {
                        self.verification.discard(&rejected);
                    }
                    match self.verify().await {
                        Ok(fresh) => token = Some(fresh),
                        Err(outcome) => return outcome,
                    }
                }
            }
        }
    }

    fn settle(&self, action: Action) -> Settled {
        debug!(?action, "routing cashier response");
        let outcome = match action {
            Action::RetryVerification => return Settled::Reverify,
            Action::ShowConsentFlow => {
                self.show_consent_form();
                self.finish(GateOutcome::ConsentPending)
            }
            Action::ShowCanned(message) => self.notify(message.notice()),
            Action::ShowCustom(text) => self.notify(Notice::custom_error(text)),
            Action::Embed(url) => {
                let is_crypto = self
                    .client
                    .selected_currency()
                    .is_some_and(|currency| self.currencies.is_crypto(currency));
                let frame = self.session.embed(&url, is_crypto);
                self.finish(GateOutcome::Embedded { frame })
            }
        };
        Settled::Done(outcome)
    }

    async fn verify(&self) -> std::result::Result<VerificationToken, GateOutcome> {
        let outcome = self.verification.resolve().await;
        if self.is_disposed() {
            return Err(GateOutcome::Abandoned);
        }
        match outcome {
            VerificationOutcome::TokenReady(token) => Ok(token),
            VerificationOutcome::Dismissed => Err(self.finish(GateOutcome::VerificationCancelled)),
            other => match other.notice() {
                Some(notice) => Err(self.notify(notice)),
                None => Err(self.finish(GateOutcome::VerificationCancelled)),
            },
        }
    }

    fn current_token(&self) -> Option<VerificationToken> {
        match self.verification.state() {
            VerificationState::TokenReady(token) => Some(token),
            _ => None,
        }
    }

    fn block(&self, reason: BlockingReason) -> GateOutcome {
        match reason {
            BlockingReason::NoCurrencySelected => {
                let target = format!(
                    "{}#redirect_{}",
                    self.config.currency_selection_path, self.cashier_type
                );
                self.view.redirect(&target);
            }
            BlockingReason::ConsentRequired => self.show_consent_form(),
            _ => {
                if let Some(notice) = reason.notice() {
                    self.show(&notice);
                }
            }
        }
        self.finish(GateOutcome::Blocked { reason })
    }

    fn show_consent_form(&self) {
        self.view.hide_loading();
        self.view.show_consent_form();
        self.consent_pending.store(true, Ordering::SeqCst);
    }

    fn notify(&self, notice: Notice) -> GateOutcome {
        self.show(&notice);
        self.finish(GateOutcome::Notice { notice })
    }

    fn show(&self, notice: &Notice) {
        self.view.hide_loading();
        self.view.show_notice(notice);
    }

    /// Refreshes the header's account-status display without holding up
    /// the gate.
    fn refresh_status_in_background(&self) {
        let api = self.api.clone();
        let view = self.view.clone();
        let guard = self.guard.clone();
        tokio::spawn(async move {
            match api.get_account_status().await {
                Ok(_) if !guard.is_disposed() => view.refresh_account_status(),
                Ok(_) => {}
                Err(err) => warn!(error = %err, "account status refresh failed"),
            }
        });
    }

    fn enter(&self, stage: Stage) {
        debug!(?stage, cashier = %self.cashier_type, "entering stage");
        *lock(&self.stage) = stage;
    }

    fn finish(&self, outcome: GateOutcome) -> GateOutcome {
        self.enter(Stage::Terminal);
        info!(?outcome, "cashier flow settled");
        outcome
    }
}

fn settled<T>(lookup: &str, result: Result<T>) -> Option<T> {
    result
        .map_err(|err| warn!(lookup, error = %err, "supplementary lookup failed"))
        .ok()
}
