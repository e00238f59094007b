//! Logging bootstrap
//!
//! Installs a `tracing` fmt subscriber filtered by `RUST_LOG` when set, and by
//! the configured level otherwise. An already-installed global subscriber is
//! left in place.

use tokentra_common::{Result, TokenTraError};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Parse a level name. Accepts tracing names and the `WARNING`/`CRITICAL`
/// spellings used by other TokenTra SDKs.
pub fn parse_level(name: &str) -> Result<Level> {
    match name.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" | "FATAL" => Ok(Level::ERROR),
        other => Err(TokenTraError::Config(format!("Unknown log level: {}", other))),
    }
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init(level: Level) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("tokentra_sdk={0},tokentra_meter={0}", level))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
