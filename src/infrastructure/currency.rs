use crate::config::{CryptoCurrencyConfig, GateConfig};
use crate::domain::ports::CurrencyCatalog;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Currency facts backed by the static configuration.
#[derive(Debug, Clone)]
pub struct StaticCurrencyCatalog {
    crypto: BTreeMap<String, CryptoCurrencyConfig>,
    fiat_minimum: Decimal,
    crypto_minimum: Decimal,
}

impl StaticCurrencyCatalog {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            crypto: config.crypto_currencies.clone(),
            fiat_minimum: config.fiat_minimum_withdrawal,
            crypto_minimum: config.crypto_minimum_withdrawal,
        }
    }
}

impl Default for StaticCurrencyCatalog {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}

impl CurrencyCatalog for StaticCurrencyCatalog {
    fn is_crypto(&self, currency: &str) -> bool {
        self.crypto.contains_key(currency)
    }

    fn min_withdrawal(&self, currency: &str) -> Decimal {
        match self.crypto.get(currency) {
            Some(config) => config.minimum_withdrawal.unwrap_or(self.crypto_minimum),
            None => self.fiat_minimum,
        }
    }
}
