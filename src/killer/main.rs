use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

#[path = "../killer/mod.rs"]
mod killer;

use killer::{Config, KillRequest, Selector};

#[derive(Parser)]
#[command(name = "killstream")]
#[command(about = "Killing Plex streams from Tautulli", version)]
struct Args {
    /// Base URL of the Tautulli server
    #[arg(long, env = "TAUTULLI_URL")]
    url: String,

    /// Tautulli API key
    #[arg(long, env = "TAUTULLI_APIKEY", hide_env_values = true)]
    apikey: String,

    /// Kill selector
    #[arg(long, value_enum)]
    jbop: Selector,

    /// The unique identifier for the user
    #[arg(long = "userId", required_if_eq("jbop", "allStreams"))]
    user_id: Option<i64>,

    /// The username of the person streaming
    #[arg(long)]
    username: Option<String>,

    /// The unique identifier for the stream
    #[arg(long = "sessionId")]
    session_id: String,

    /// Notification agent ID to send the kill notification to
    #[arg(long)]
    notify: Option<i64>,

    /// Message to send to the user whose stream is killed
    #[arg(long = "killMessage", num_args = 1..)]
    kill_message: Vec<String>,

    /// Skip TLS certificate verification (compatibility with self-signed setups)
    #[arg(long, env = "TAUTULLI_INSECURE")]
    insecure: bool,

    /// HTTP request timeout in seconds
    #[arg(long, env = "TAUTULLI_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    killer::logging::init();

    let config = Config::new(&args.url, &args.apikey, args.timeout_secs, !args.insecure)?;
    let request = KillRequest {
        selector: args.jbop,
        session_id: args.session_id,
        user_id: args.user_id,
        username: args.username,
        notifier_id: args.notify,
        message: args.kill_message.join(" "),
    };

    let report = killer::run(Arc::new(config), request).await?;

    // Failures were already logged at the call site; the process still
    // exits 0 so a partial fan-out does not break the calling agent.
    if !report.failed.is_empty() {
        for failure in &report.failed {
            tracing::debug!(
                "session {} was not terminated: {}",
                failure.session_id,
                failure.detail
            );
        }
        tracing::warn!(
            "{} of {} termination attempts failed",
            report.failed.len(),
            report.killed.len() + report.failed.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const BASE: [&str; 7] = [
        "killstream",
        "--url",
        "http://tautulli.local:8181",
        "--apikey",
        "testkey",
        "--sessionId",
        "abc123",
    ];

    fn parse(extra: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(BASE.iter().copied().chain(extra.iter().copied()))
    }

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn kill_message_words_are_joined_with_spaces() {
        let args = parse(&["--jbop", "stream", "--killMessage", "Stop", "streaming", "4k"])
            .unwrap();
        assert_eq!(args.kill_message.join(" "), "Stop streaming 4k");
    }

    #[test]
    fn missing_kill_message_means_empty_string() {
        let args = parse(&["--jbop", "stream"]).unwrap();
        assert_eq!(args.kill_message.join(" "), "");
    }

    #[test]
    fn user_id_is_required_for_all_streams() {
        assert!(parse(&["--jbop", "allStreams"]).is_err());
        assert!(parse(&["--jbop", "allStreams", "--userId", "42"]).is_ok());
    }

    #[test]
    fn user_id_is_optional_for_a_single_stream() {
        let args = parse(&["--jbop", "stream"]).unwrap();
        assert_eq!(args.user_id, None);
        assert_eq!(args.jbop, Selector::Stream);
    }

    #[test]
    fn selector_uses_the_original_literals() {
        assert!(parse(&["--jbop", "all-streams", "--userId", "1"]).is_err());
        assert_eq!(
            parse(&["--jbop", "allStreams", "--userId", "1"]).unwrap().jbop,
            Selector::AllStreams
        );
    }
}
