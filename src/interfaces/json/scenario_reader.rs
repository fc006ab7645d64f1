use crate::application::consent::ConsentForm;
use crate::application::gate::{Collaborators, GateOutcome, SessionGate};
use crate::config::GateConfig;
use crate::domain::blocking::BlockingReason;
use crate::domain::cashier::{
    ApiReply, CashierResponse, FrameHeightMessage, StatementEntry, TradingAccount, WithdrawalLimits,
};
use crate::domain::client::ClientProfile;
use crate::domain::location::PageLocation;
use crate::domain::status::AccountStatusResponse;
use crate::error::Result;
use crate::infrastructure::currency::StaticCurrencyCatalog;
use crate::infrastructure::in_memory::{
    ApiCall, RecordingView, Scripted, ScriptedCashierApi, StaticFieldLabels, ViewEvent,
};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

/// A scripted reply as written in a scenario file: either the API payload
/// itself or `{"transport_error": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptedReply<T> {
    TransportError { transport_error: String },
    Reply(T),
}

impl<T> ScriptedReply<T> {
    fn into_scripted(self) -> Scripted<T> {
        match self {
            Self::TransportError { transport_error } => Err(transport_error),
            Self::Reply(reply) => Ok(reply),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScriptedResponses {
    pub account_status: Option<ScriptedReply<AccountStatusResponse>>,
    pub cashier: Vec<ScriptedReply<CashierResponse>>,
    pub verify_email: Option<ScriptedReply<ApiReply>>,
    pub consent: Option<ScriptedReply<ApiReply>>,
    pub statement: Option<ScriptedReply<Vec<StatementEntry>>>,
    pub mt5_login_list: Option<ScriptedReply<Vec<TradingAccount>>>,
    pub limits: Option<ScriptedReply<WithdrawalLimits>>,
}

impl ScriptedResponses {
    async fn install(self, api: &ScriptedCashierApi) {
        if let Some(reply) = self.account_status {
            api.set_account_status(reply.into_scripted()).await;
        }
        for reply in self.cashier {
            api.push_cashier(reply.into_scripted()).await;
        }
        if let Some(reply) = self.verify_email {
            api.set_verify_email(reply.into_scripted()).await;
        }
        if let Some(reply) = self.consent {
            api.set_consent(reply.into_scripted()).await;
        }
        if let Some(reply) = self.statement {
            api.set_statement(reply.into_scripted()).await;
        }
        if let Some(reply) = self.mt5_login_list {
            api.set_trading_accounts(reply.into_scripted()).await;
        }
        if let Some(reply) = self.limits {
            api.set_limits(reply.into_scripted()).await;
        }
    }
}

/// The user's answers on the consent form, if it gets shown.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ConsentAnswers {
    #[serde(default)]
    pub funds_protection: bool,
    #[serde(default)]
    pub terms: bool,
}

impl ConsentAnswers {
    pub fn form(self) -> ConsentForm {
        let mut form = ConsentForm::new();
        if self.funds_protection {
            form = form.acknowledge_funds_protection();
        }
        if self.terms {
            form = form.accept_terms();
        }
        form
    }
}

/// One simulated page activation.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub client: ClientProfile,
    pub page_url: String,
    #[serde(default)]
    pub responses: ScriptedResponses,
    /// Code typed into the host application's code entry.
    #[serde(default)]
    pub verification_code: Option<String>,
    #[serde(default)]
    pub consent: Option<ConsentAnswers>,
    /// Messages posted to the page after the flow settles.
    #[serde(default)]
    pub frame_messages: Vec<FrameHeightMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub outcome: GateOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_outcome: Option<GateOutcome>,
    pub frame_height: Option<u32>,
    pub api_calls: Vec<ApiCall>,
    pub events: Vec<ViewEvent>,
}

impl Scenario {
    /// Plays the scenario against in-memory collaborators and tears the
    /// flow down afterwards.
    pub async fn play(self, config: GateConfig) -> Result<ScenarioReport> {
        let location = PageLocation::parse(&self.page_url)?;
        let api = ScriptedCashierApi::new();
        self.responses.install(&api).await;
        let view = match self.verification_code {
            Some(code) => RecordingView::new().with_verification_code(code),
            None => RecordingView::new(),
        };

        let collaborators = Collaborators {
            api: Arc::new(api.clone()),
            view: Arc::new(view.clone()),
            labels: Arc::new(StaticFieldLabels::english()),
            currencies: Arc::new(StaticCurrencyCatalog::from_config(&config)),
        };
        let gate = SessionGate::new(config, self.client, location, collaborators)?;

        let outcome = gate.run().await;
        let consent_shown = matches!(
            outcome,
            GateOutcome::ConsentPending
                | GateOutcome::Blocked {
                    reason: BlockingReason::ConsentRequired
                }
        );
        let consent_outcome = match self.consent {
            Some(answers) if consent_shown => Some(gate.submit_consent(answers.form()).await?),
            _ => None,
        };

        for message in &self.frame_messages {
            gate.on_frame_message(message);
        }
        let frame_height = gate.frame().and_then(|frame| frame.height);
        gate.teardown();

        Ok(ScenarioReport {
            outcome,
            consent_outcome,
            frame_height,
            api_calls: api.calls().await,
            events: view.events(),
        })
    }
}

/// Reads a [`Scenario`] from any JSON source.
pub struct ScenarioReader<R: Read> {
    source: R,
}

impl<R: Read> ScenarioReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn scenario(self) -> Result<Scenario> {
        Ok(serde_json::from_reader(self.source)?)
    }
}
