use tracing_subscriber::{fmt, EnvFilter};

/// Installs the process-wide subscriber. Logs go to stderr; stdout carries
/// the IPC responses and must stay clean.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
