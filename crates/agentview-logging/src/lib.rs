//! # agentview-logging
//!
//! Tracing setup shared by the agentview binary.
//!
//! ## Log Formats
//!
//! - `Pretty` - Human-readable output
//! - `JSON` - Structured JSON lines
//! - `Compact` - Minimal text output
//!
//! Logs always go to stderr so command output on stdout stays machine
//! readable.
//!
//! ## What gets logged
//!
//! - `warn` - hook records, log lines and log files skipped as malformed or
//!   unreadable while loading events; records dropped for a missing session id
//! - `info` - the `serve` listen address and event source, and each feedback
//!   record saved through the API
//! - `error` - feedback store and event source failures behind API 5xx
//!   responses, and a failed Ctrl+C listener during shutdown
//! - `debug` - event counts per load or fetch, session grouping, database
//!   open, feedback creation and updates of unknown ids in either store
//!
//! The default level is `info`; pass `--log-level debug` or set `RUST_LOG`
//! to see per-load detail.

mod format;

pub use format::LogFormat;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application. `RUST_LOG` overrides `level`.
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}
