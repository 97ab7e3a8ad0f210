//! Process-level setup for hosts embedding the engine.

use crate::error::{Result, ScanError};

/// Initialize logging with tracing_subscriber.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(directive("aiready=debug")?)
        .add_directive(directive("info")?);

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .is_err()
    {
        tracing::trace!("[LIFECYCLE] Subscriber already installed");
    }
    Ok(())
}

fn directive(value: &str) -> Result<tracing_subscriber::filter::Directive> {
    value
        .parse()
        .map_err(|e| ScanError::config(format!("invalid log directive '{}': {}", value, e)))
}
