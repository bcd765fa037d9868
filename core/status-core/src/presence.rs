//! Presence endpoint client.
//!
//! One call, one GET. Retrying is the scheduler's job (the next tick).

use std::time::Duration;

use crate::error::{Result, StatusError};

pub const DEFAULT_PRESENCE_URL: &str =
    "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v0002/";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Fetches the raw presence payload for one account.
pub trait PresenceClient: Send + Sync {
    fn fetch(&self, api_key: &str, steam_id: &str) -> Result<String>;
}

/// Builds `<base>?key=<api_key>&steamids=<steam_id>`, percent-encoding both
/// values.
pub fn presence_url(base: &str, api_key: &str, steam_id: &str) -> Result<reqwest::Url> {
    reqwest::Url::parse_with_params(base, &[("key", api_key), ("steamids", steam_id)])
        .map_err(|err| StatusError::Network(format!("Invalid presence URL {base}: {err}")))
}

/// Blocking client for the Steam Web API player-summaries endpoint.
#[derive(Debug, Clone)]
pub struct SteamWebClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl SteamWebClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_PRESENCE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl PresenceClient for SteamWebClient {
    fn fetch(&self, api_key: &str, steam_id: &str) -> Result<String> {
        let url = presence_url(&self.base_url, api_key, steam_id)?;
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.text()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_key_and_id() {
        let url = presence_url(DEFAULT_PRESENCE_URL, "ABC123", "76561197960435530").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v0002/?key=ABC123&steamids=76561197960435530"
        );
    }

    #[test]
    fn url_encodes_reserved_characters() {
        let url = presence_url("http://localhost:9/presence", "a&b", "1 2").unwrap();
        let query = url.query().unwrap();
        assert!(query.starts_with("key=a%26b&steamids=1"), "{query}");
        assert!(!query.contains(' '));
    }

    #[test]
    fn invalid_base_is_a_network_error() {
        let err = presence_url("not a url", "k", "1").unwrap_err();
        assert!(matches!(err, StatusError::Network(_)));
    }
}
