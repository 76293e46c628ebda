//! Diagnostic logging to stderr.
//!
//! `RUST_LOG` takes precedence; otherwise only warnings are shown unless
//! `--verbose` asks for this crate's debug output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,sparkle=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Calling this twice is harmless.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_enables_crate_debug_output() {
        assert_eq!(default_filter(false), "warn");
        assert_eq!(default_filter(true), "warn,sparkle=debug");
        assert!(EnvFilter::try_new(default_filter(true)).is_ok());
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing(false);
        init_tracing(true);
    }
}
