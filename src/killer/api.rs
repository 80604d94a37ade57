use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::config::Config;
use super::error::{Result, TautulliError};

/// One active playback stream, as reported by `get_activity`. Tautulli
/// returns many more fields per session; only these two are consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: ApiResponse<T>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    #[serde(default)]
    result: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ActivityData {
    #[serde(default)]
    sessions: Vec<SessionRecord>,
}

pub struct TautulliClient {
    http: Client,
    config: Arc<Config>,
}

impl TautulliClient {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("killstream/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout);
        if !config.verify_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        Ok(Self { http, config })
    }

    /// Current activity on the PMS, via the `get_activity` command.
    pub async fn get_activity(&self) -> Result<Vec<SessionRecord>> {
        debug!("fetching current activity from {}", self.config.base_url);

        let response = self
            .http
            .get(self.config.api_endpoint())
            .query(&[
                ("apikey", self.config.api_key.as_str()),
                ("cmd", "get_activity"),
            ])
            .send()
            .await?;

        let inner = Self::parse::<ActivityData>(response).await?;
        let sessions = inner.data.unwrap_or_default().sessions;
        debug!("server reported {} active sessions", sessions.len());
        Ok(sessions)
    }

    /// Stop a streaming session, showing `message` to the affected user.
    pub async fn terminate_session(&self, session_id: &str, message: &str) -> Result<()> {
        let response = self
            .http
            .post(self.config.api_endpoint())
            .query(&[
                ("apikey", self.config.api_key.as_str()),
                ("cmd", "terminate_session"),
                ("session_id", session_id),
                ("message", message),
            ])
            .send()
            .await?;

        Self::parse::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Send a subject/body notification through a Tautulli notification agent.
    pub async fn notify(&self, notifier_id: i64, subject: &str, body: &str) -> Result<()> {
        let notifier_id = notifier_id.to_string();
        let response = self
            .http
            .post(self.config.api_endpoint())
            .query(&[
                ("apikey", self.config.api_key.as_str()),
                ("cmd", "notify"),
                ("notifier_id", notifier_id.as_str()),
                ("subject", subject),
                ("body", body),
            ])
            .send()
            .await?;

        Self::parse::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn parse<T>(response: reqwest::Response) -> Result<ApiResponse<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response>".to_string());
            return Err(TautulliError::Api(format!("HTTP {}: {}", status, text)));
        }

        let envelope: Envelope<T> = response.json().await?;
        let inner = envelope.response;
        if inner.result != "success" {
            return Err(TautulliError::Api(inner.message.unwrap_or_else(|| {
                format!("API returned result '{}'", inner.result)
            })));
        }
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_envelope_parses_sessions() {
        let raw = r#"{"response":{"result":"success","data":{"sessions":[
            {"session_id":"abc","user_id":5,"title":"Movie","state":"playing"},
            {"session_id":"def","user_id":9}
        ]}}}"#;
        let envelope: Envelope<ActivityData> = serde_json::from_str(raw).unwrap();
        let sessions = envelope.response.data.unwrap().sessions;
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "abc");
        assert_eq!(sessions[0].user_id, 5);
    }

    #[test]
    fn activity_envelope_tolerates_a_missing_sessions_key() {
        let raw = r#"{"response":{"result":"success","data":{}}}"#;
        let envelope: Envelope<ActivityData> = serde_json::from_str(raw).unwrap();
        assert!(envelope.response.data.unwrap().sessions.is_empty());
    }

    #[test]
    fn activity_envelope_tolerates_missing_data() {
        let raw = r#"{"response":{"result":"success"}}"#;
        let envelope: Envelope<ActivityData> = serde_json::from_str(raw).unwrap();
        assert!(envelope.response.data.is_none());
    }

    #[test]
    fn error_envelope_carries_the_message() {
        let raw = r#"{"response":{"result":"error","message":"bad session"}}"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.response.result, "error");
        assert_eq!(envelope.response.message.as_deref(), Some("bad session"));
    }
}
