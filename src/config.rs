//! Runtime configuration for a cashier page activation.
//!
//! Every field has a default so an empty JSON object is a valid configuration.

use crate::error::{CashierError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Per-currency overrides for cryptocurrencies.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CryptoCurrencyConfig {
    #[serde(default)]
    pub minimum_withdrawal: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// The site's own domain. Frame messages from `www.<site_domain>` are ignored.
    pub site_domain: String,
    /// Frame height used for crypto cashiers and for non-numeric height messages.
    pub default_frame_height: u32,
    /// Delay between embedding the provider frame and hiding the loading bar.
    pub loading_grace_ms: u64,
    /// Path markers selecting an alternate payment provider.
    pub provider_markers: Vec<String>,
    pub currency_selection_path: String,
    pub crypto_currencies: BTreeMap<String, CryptoCurrencyConfig>,
    pub fiat_minimum_withdrawal: Decimal,
    pub crypto_minimum_withdrawal: Decimal,
}

impl Default for GateConfig {
    fn default() -> Self {
        let crypto_currencies = ["BTC", "ETH", "LTC", "UST", "USDC"]
            .into_iter()
            .map(|code| (code.to_string(), CryptoCurrencyConfig::default()))
            .collect();

        Self {
            site_domain: "binary.com".to_string(),
            default_frame_height: 700,
            loading_grace_ms: 1000,
            provider_markers: vec!["epg".to_string()],
            currency_selection_path: "user/set-currency".to_string(),
            crypto_currencies,
            fiat_minimum_withdrawal: dec!(1),
            crypto_minimum_withdrawal: dec!(0.002),
        }
    }
}

impl GateConfig {
    /// Loads a configuration file, filling unspecified fields with defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.site_domain.trim().is_empty() {
            return Err(CashierError::Config("site_domain must not be empty".to_string()));
        }
        if self.default_frame_height == 0 {
            return Err(CashierError::Config(
                "default_frame_height must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn loading_grace(&self) -> Duration {
        Duration::from_millis(self.loading_grace_ms)
    }
}
