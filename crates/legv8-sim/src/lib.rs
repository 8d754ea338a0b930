//! Command-line runner and interactive shell for the LEGv8 emulator core.

/// Register and memory dump formatting.
pub mod dump;
/// Tracing subscriber setup for the binary.
pub mod logging;
/// Serializable run summaries.
pub mod report;
/// Interactive shell command parsing and session state.
pub mod shell;

#[cfg(test)]
use tempfile as _;
