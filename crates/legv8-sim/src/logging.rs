//! Tracing subscriber installation for the command-line binary.
//!
//! Events go to stderr so register dumps and JSON reports on stdout stay
//! machine-readable.

use std::io;

use thiserror::Error;
use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Filter used when neither `--verbose` nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str = "warn";
/// Filter forced by `--verbose`.
pub const VERBOSE_FILTER: &str = "debug";

/// Failure while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {source}")]
    Filter {
        /// Directive that failed to parse.
        directive: String,
        /// Parser error.
        #[source]
        source: ParseError,
    },
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] SetGlobalDefaultError),
}

/// Picks the filter directive: `--verbose` wins, then `RUST_LOG`, then
/// [`DEFAULT_FILTER`].
#[must_use]
pub fn filter_directive(verbose: bool, rust_log: Option<&str>) -> String {
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    match rust_log.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Installs a stderr `fmt` subscriber filtered per [`filter_directive`].
///
/// # Errors
///
/// Returns [`LoggingError`] when `RUST_LOG` holds an invalid directive or a
/// subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<(), LoggingError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(verbose, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|source| LoggingError::Filter { directive, source })?;

    let fmt_layer = fmt::layer().with_target(false).with_writer(io::stderr);
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    set_global_default(subscriber)?;
    Ok(())
}
