// Stream killer modules
mod api;
mod config;
mod error;
pub mod logging;

pub use api::{SessionRecord, TautulliClient};
pub use config::Config;
pub use error::{Result, TautulliError};

use std::sync::Arc;

use clap::ValueEnum;
use tracing::error;

const SUBJECT_TEXT: &str = "Tautulli has killed a stream.";

/// Which streams one invocation kills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Selector {
    /// Kill only the named session
    #[value(name = "stream")]
    Stream,
    /// Kill every session currently attributed to the user
    #[value(name = "allStreams")]
    AllStreams,
}

#[derive(Debug, Clone)]
pub struct KillRequest {
    pub selector: Selector,
    pub session_id: String,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub notifier_id: Option<i64>,
    pub message: String,
}

/// Outcome of one invocation. Failures are recorded here in addition
/// to the log line written when they happen.
#[derive(Debug, Default)]
pub struct KillReport {
    pub killed: Vec<String>,
    pub failed: Vec<KillFailure>,
}

#[derive(Debug)]
pub struct KillFailure {
    pub session_id: String,
    pub detail: String,
}

pub async fn run(config: Arc<Config>, request: KillRequest) -> Result<KillReport> {
    let client = TautulliClient::new(config)?;

    let targets = match request.selector {
        Selector::Stream => vec![request.session_id.clone()],
        Selector::AllStreams => match request.user_id {
            // The argument parser enforces --userId for allStreams; the
            // guard covers callers that build a KillRequest directly.
            Some(user_id) => resolve_user_sessions(&client, user_id).await,
            None => Vec::new(),
        },
    };

    let mut report = KillReport::default();
    for session_id in &targets {
        kill_one(&client, session_id, &request, &mut report).await;
    }
    Ok(report)
}

/// Session ids for every stream the user currently has open, in
/// server-reported order. An activity failure logs once and yields an
/// empty list, the same as a user with nothing playing.
async fn resolve_user_sessions(client: &TautulliClient, user_id: i64) -> Vec<String> {
    match client.get_activity().await {
        Ok(sessions) => sessions
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.session_id)
            .collect(),
        Err(e) => {
            error!("Tautulli API 'get_activity' request failed: {}", e);
            Vec::new()
        }
    }
}

async fn kill_one(
    client: &TautulliClient,
    session_id: &str,
    request: &KillRequest,
    report: &mut KillReport,
) {
    match client.terminate_session(session_id, &request.message).await {
        Ok(()) => {
            println!("Successfully killed Plex session: {}.", session_id);
            report.killed.push(session_id.to_string());

            if let Some(notifier_id) = request.notifier_id {
                let body =
                    notification_body(session_id, request.username.as_deref(), &request.message);
                match client.notify(notifier_id, SUBJECT_TEXT, &body).await {
                    Ok(()) => println!("Successfully sent Tautulli notification."),
                    Err(e) => error!("Tautulli API 'notify' request failed: {}", e),
                }
            }
        }
        Err(e) => {
            error!("Tautulli API 'terminate_session' request failed: {}", e);
            report.failed.push(KillFailure {
                session_id: session_id.to_string(),
                detail: e.to_string(),
            });
        }
    }
}

fn notification_body(session_id: &str, username: Option<&str>, message: &str) -> String {
    match username {
        Some(user) => format!("Killed {}'s stream. Reason: {}.", user, message),
        None => format!("Killed session ID '{}'. Reason: {}", session_id, message),
    }
}
