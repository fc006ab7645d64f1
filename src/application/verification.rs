//! Email-verification sub-flow for withdrawals.
//!
//! ```text
//! NoToken ──► EmailRequested ──► CodeEntryPending ──► TokenReady
//!    │                                                   ▲
//!    └──────────── well-formed token in the URL ─────────┘
//! ```

use crate::domain::blocking::Notice;
use crate::domain::cashier::{ApiReply, VerificationToken, VerifyEmailRequest};
use crate::domain::ports::{CashierApiRef, CashierViewRef};
use crate::sync::lock;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationState {
    NoToken,
    EmailRequested,
    CodeEntryPending,
    TokenReady(VerificationToken),
}

/// Result of the verification-email request, cached per page activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailReply {
    Sent,
    Rejected(String),
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    TokenReady(VerificationToken),
    /// A verification email was sent; the user continues from the link.
    CheckEmail,
    EmailFailed(String),
    InvalidToken,
    /// Code entry in the host application was dismissed.
    Dismissed,
}

impl VerificationOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::TokenReady(_) | Self::Dismissed => None,
            Self::CheckEmail => Some(Notice::message("check_email_message")),
            Self::EmailFailed(message) => Some(Notice::custom_error(message.clone())),
            Self::InvalidToken => Some(Notice::error("token_error")),
        }
    }
}

pub struct VerificationFlow {
    api: CashierApiRef,
    view: CashierViewRef,
    email: String,
    host_app: bool,
    url_token: Option<VerificationToken>,
    email_reply: Mutex<Arc<OnceCell<EmailReply>>>,
    rejected: Mutex<Vec<VerificationToken>>,
    state: Mutex<VerificationState>,
}

impl VerificationFlow {
    pub fn new(
        api: CashierApiRef,
        view: CashierViewRef,
        email: impl Into<String>,
        host_app: bool,
        url_token: Option<VerificationToken>,
    ) -> Self {
        Self {
            api,
            view,
            email: email.into(),
            host_app,
            url_token,
            email_reply: Mutex::new(Arc::new(OnceCell::new())),
            rejected: Mutex::new(Vec::new()),
            state: Mutex::new(VerificationState::NoToken),
        }
    }

    pub fn state(&self) -> VerificationState {
        lock(&self.state).clone()
    }

    /// Sends the verification email at most once per page activation.
    /// Concurrent callers share the single in-flight request.
    pub async fn request_email(&self) -> EmailReply {
        let cell = Arc::clone(&lock(&self.email_reply));
        let reply = cell.get_or_init(|| async {
            debug!("requesting payment verification email");
            let request = VerifyEmailRequest::payment_withdraw(self.email.clone());
            match self.api.verify_email(&request).await {
                Ok(ApiReply { error: None }) => EmailReply::Sent,
                Ok(ApiReply { error: Some(error) }) => EmailReply::Rejected(error.message),
                Err(err) => {
                    warn!(error = %err, "verification email request failed");
                    EmailReply::Unreachable(err.to_string())
                }
            }
        })
        .await;
        reply.clone()
    }

    /// Drives the flow until a token is ready or a message must be shown.
    pub async fn resolve(&self) -> VerificationOutcome {
        if self.host_app {
            return self.resolve_with_code_entry().await;
        }

        let token = self.url_token.clone().filter(|token| !self.was_rejected(token));
        match token {
            None => {
                self.set_state(VerificationState::EmailRequested);
                match self.request_email().await {
                    EmailReply::Sent => VerificationOutcome::CheckEmail,
                    EmailReply::Rejected(message) | EmailReply::Unreachable(message) => {
                        VerificationOutcome::EmailFailed(message)
                    }
                }
            }
            Some(token) if !token.is_well_formed() => VerificationOutcome::InvalidToken,
            Some(token) => self.ready(token),
        }
    }

    /// The host application always sends a fresh email and asks for the code
    /// in-app, ignoring any token in the URL.
    async fn resolve_with_code_entry(&self) -> VerificationOutcome {
        self.set_state(VerificationState::EmailRequested);
        self.view.hide_loading();
        self.view.show_code_entry();
        self.set_state(VerificationState::CodeEntryPending);

        let (_, code) = tokio::join!(self.request_email(), self.view.verification_code());
        match code {
            Some(code) => self.ready(VerificationToken::new(code)),
            None => VerificationOutcome::Dismissed,
        }
    }

    fn ready(&self, token: VerificationToken) -> VerificationOutcome {
        self.set_state(VerificationState::TokenReady(token.clone()));
        VerificationOutcome::TokenReady(token)
    }

    /// Marks a token the server refused so it is not offered again.
    pub fn discard(&self, token: &VerificationToken) {
        lock(&self.rejected).push(token.clone());
        self.set_state(VerificationState::NoToken);
    }

    /// Drops the cached email reply; a later activation starts clean.
    pub fn reset(&self) {
        *lock(&self.email_reply) = Arc::new(OnceCell::new());
        lock(&self.rejected).clear();
        self.set_state(VerificationState::NoToken);
    }

    fn was_rejected(&self, token: &VerificationToken) -> bool {
        lock(&self.rejected).contains(token)
    }

    fn set_state(&self, state: VerificationState) {
        *lock(&self.state) = state;
    }
}
