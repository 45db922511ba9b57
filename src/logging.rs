//! Opt-in `tracing` subscriber setup.
//!
//! The library only emits events; binaries and tests that want to see them
//! call [`init_with_level`] once.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use crate::error::{CryptoNightError, Result};

static INIT: Once = Once::new();

/// Filter used when neither an explicit level nor `RUST_LOG` is usable.
const DEFAULT_FILTER: &str = "info";

/// Installs a compact fmt subscriber, at most once per process.
///
/// `level` takes precedence over `RUST_LOG`. An unparsable filter falls back
/// to `info` with a warning on stderr. Does nothing if another global
/// subscriber is already installed.
pub fn init_with_level(level: Option<&str>) {
    INIT.call_once(|| {
        if tracing::dispatcher::has_been_set() {
            return;
        }

        let env = match level {
            Some(l) if !l.is_empty() => l.to_string(),
            _ => std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
        };

        let filter = try_filter(&env).unwrap_or_else(|e| {
            eprintln!("WARN: {e}; falling back to '{DEFAULT_FILTER}'");
            EnvFilter::new(DEFAULT_FILTER)
        });

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .compact()
            .try_init();
    });
}

/// Parses a filter directive such as `cryptonight_r=debug`.
///
/// # Errors
/// Returns [`CryptoNightError::InvalidLogFilter`] if the directive does not parse.
pub fn try_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| CryptoNightError::InvalidLogFilter(format!("'{directives}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_filter_accepts_directives() {
        assert!(try_filter("info").is_ok());
        assert!(try_filter("cryptonight_r=trace,warn").is_ok());
    }

    #[test]
    fn test_try_filter_rejects_garbage() {
        let err = try_filter("cryptonight_r=notalevel").unwrap_err();
        assert!(matches!(err, CryptoNightError::InvalidLogFilter(_)));
    }

    #[test]
    fn test_init_is_idempotent() {
        init_with_level(Some("debug"));
        init_with_level(Some("trace"));
        tracing::debug!("logging initialized");
    }
}
