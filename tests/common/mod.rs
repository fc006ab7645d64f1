#![allow(dead_code)]

use cashier_gate::application::gate::{Collaborators, SessionGate};
use cashier_gate::config::GateConfig;
use cashier_gate::domain::client::ClientProfile;
use cashier_gate::domain::location::PageLocation;
use cashier_gate::domain::status::{AccountStatus, AccountStatusResponse};
use cashier_gate::infrastructure::currency::StaticCurrencyCatalog;
use cashier_gate::infrastructure::in_memory::{RecordingView, ScriptedCashierApi, StaticFieldLabels};
use rust_decimal::Decimal;
use std::sync::Arc;

pub const DEPOSIT_URL: &str = "https://www.binary.com/en/cashier/forwardws.html?action=deposit";
pub const WITHDRAW_URL: &str = "https://www.binary.com/en/cashier/forwardws.html?action=withdraw";

pub fn client(currency: &str, balance: Decimal) -> ClientProfile {
    ClientProfile::new("client@example.com")
        .with_currency(currency)
        .with_balance(balance)
}

pub fn status(flags: &[&str], validation: &[&str]) -> AccountStatus {
    AccountStatus {
        status_flags: flags.iter().map(|s| s.to_string()).collect(),
        cashier_validation: validation.iter().map(|s| s.to_string()).collect(),
        ..AccountStatus::default()
    }
}

pub fn status_reply(status: AccountStatus) -> AccountStatusResponse {
    AccountStatusResponse {
        get_account_status: Some(status),
        error: None,
    }
}

pub fn config() -> GateConfig {
    GateConfig {
        loading_grace_ms: 0,
        ..GateConfig::default()
    }
}

pub fn gate(
    client: ClientProfile,
    url: &str,
    api: &ScriptedCashierApi,
    view: &RecordingView,
) -> SessionGate {
    let config = config();
    let collaborators = Collaborators {
        api: Arc::new(api.clone()),
        view: Arc::new(view.clone()),
        labels: Arc::new(StaticFieldLabels::english()),
        currencies: Arc::new(StaticCurrencyCatalog::from_config(&config)),
    };
    SessionGate::new(config, client, PageLocation::parse(url).unwrap(), collaborators).unwrap()
}
