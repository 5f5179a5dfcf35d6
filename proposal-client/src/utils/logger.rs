//! Logging for the CLI.
//!
//! `RUST_LOG` takes precedence over `--log-level` and the `[log]` section of
//! the config file. Output goes to stderr; stdout carries only the JSON the
//! commands print.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. An unparsable `level` falls back to `warn`.
///
/// Fails if a global subscriber is already set.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_installs_once() {
        assert!(init("not a level [").is_ok());
        tracing::warn!("logger installed");

        // Second call must not replace the subscriber
        assert!(init("debug").is_err());
    }
}
