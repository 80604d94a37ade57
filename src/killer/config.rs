use std::time::Duration;

use url::Url;

use super::error::{Result, TautulliError};

/// Process-wide settings, built once in main and passed into the client.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub verify_certs: bool,
}

impl Config {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout_secs: u64,
        verify_certs: bool,
    ) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(TautulliError::Config(
                "Tautulli API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            verify_certs,
        })
    }

    pub fn api_endpoint(&self) -> String {
        format!("{}/api/v2", self.base_url)
    }
}
