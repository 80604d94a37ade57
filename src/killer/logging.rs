use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr; stdout is reserved for the confirmation
/// lines Tautulli captures from script agents.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
