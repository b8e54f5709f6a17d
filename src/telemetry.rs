//! Logging setup for apps embedding the client.
//!
//! The library itself only emits `tracing` events; nothing is printed until
//! the host installs a subscriber, either its own or the one from
//! [`init_tracing`].

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,pawzzle_client=debug";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line text.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Install a global `tracing` subscriber.
///
/// Levels come from `RUST_LOG`, falling back to `info` with debug output for
/// this crate. Returns `false` if a global subscriber was already set.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter_layer);
    let result = match format {
        LogFormat::Compact => registry
            .with(fmt::layer().with_target(true).with_line_number(true).compact())
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().with_target(true).json())
            .try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing(LogFormat::Compact);
        assert!(!init_tracing(LogFormat::Json));
    }
}
