//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;

/// Error type for tracing initialization.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// Offending directive.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// A global subscriber is already installed.
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberError(String),
}

/// Build the level filter: `RUST_LOG` when set, the configured level otherwise.
///
/// # Errors
///
/// Returns [`TracingError::InvalidFilter`] when the configured level does not
/// parse.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TracingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| TracingError::InvalidFilter {
        filter: config.level.clone(),
        message: e.to_string(),
    })
}

/// Install the global fmt subscriber in the configured format.
///
/// # Errors
///
/// Returns an error when the filter is invalid or a subscriber is already
/// installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TracingError> {
    let filter = env_filter(config)?;
    let span_events = if config.include_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_target(true);

    let result = match config.format.as_str() {
        "pretty" => builder.pretty().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.json().with_current_span(config.include_spans).try_init(),
    };
    result.map_err(|e| TracingError::SubscriberError(e.to_string()))?;

    tracing::info!(
        level = %config.level,
        format = %config.format,
        "Tracing initialized"
    );
    Ok(())
}
