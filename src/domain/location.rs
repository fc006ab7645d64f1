use crate::domain::cashier::{CashierType, VerificationToken};
use crate::error::Result;
use url::Url;

/// The cashier page URL: `action` query parameter, `token` fragment
/// parameter and an optional provider marker in the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(Self {
            url: Url::parse(raw)?,
        })
    }

    pub fn cashier_type(&self) -> Option<CashierType> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == "action")
            .and_then(|(_, value)| CashierType::from_action(&value))
    }

    pub fn action(&self) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == "action")
            .map(|(_, value)| value.into_owned())
    }

    /// Token carried in the fragment as `token=<word characters>`.
    pub fn token(&self) -> Option<VerificationToken> {
        let fragment = self.url.fragment()?;
        let start = fragment.find("token=")? + "token=".len();
        let value: String = fragment[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if value.is_empty() {
            None
        } else {
            Some(VerificationToken::new(value))
        }
    }

    /// First configured marker found in the path selects the provider.
    pub fn provider(&self, markers: &[String]) -> Option<String> {
        let path = self.url.path();
        markers
            .iter()
            .find(|marker| !marker.is_empty() && path.contains(marker.as_str()))
            .cloned()
    }
}
