//! Tracing subscriber setup for the binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub log_level: String,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            with_target: false,
        }
    }
}

impl LogConfig {
    pub fn verbose(verbose: bool) -> Self {
        Self {
            log_level: if verbose { "debug" } else { "warn" }.to_string(),
            ..Self::default()
        }
    }
}

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG` or the config level.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(config: &LogConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.with_target);

    Registry::default()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let cfg = LogConfig::default();
        init_tracing(&cfg);
        assert!(!init_tracing(&cfg));
    }

    #[test]
    fn verbose_level() {
        assert_eq!(LogConfig::verbose(true).log_level, "debug");
        assert_eq!(LogConfig::verbose(false).log_level, "warn");
    }
}
