//! Logging initialization and configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor an explicit level is given.
pub const DEFAULT_FILTER: &str = "chess_relay=info,tower_http=info";

/// Initialize the logging system with an explicit filter directive
/// (e.g. `debug` or `chess_relay=debug,tower_http=warn`).
///
/// A bare level applies to this crate and the HTTP trace layer only. An
/// unparsable directive falls back to [`DEFAULT_FILTER`].
pub fn init_with_filter(directive: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter(directive))
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}

fn expand_directive(directive: &str) -> String {
    let directive = directive.trim();
    if directive.contains('=') || directive.contains(',') {
        directive.to_string()
    } else {
        format!("chess_relay={directive},tower_http={directive}")
    }
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(expand_directive(directive)).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
