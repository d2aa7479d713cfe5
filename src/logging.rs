//! Console logging shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// `RUST_LOG` if it parses, [`DEFAULT_FILTER`] otherwise.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global fmt subscriber. Call once at startup.
pub fn init() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_info() {
        assert_eq!(EnvFilter::new(DEFAULT_FILTER).to_string(), "info");
    }

    #[test]
    fn test_env_filter_builds() {
        // Whatever RUST_LOG holds, a filter comes back.
        let _ = env_filter();
    }
}
