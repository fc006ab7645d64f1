use thiserror::Error;

#[derive(Error, Debug)]
pub enum CashierError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid page location: {0}")]
    InvalidLocation(#[from] url::ParseError),
    #[error("Unknown cashier action: {0:?}")]
    UnknownCashierAction(String),
    #[error("Consent form requires both acknowledgements")]
    ConsentIncomplete,
    #[error("Consent was not requested or has already been submitted")]
    ConsentNotRequested,
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CashierError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, CashierError>;
