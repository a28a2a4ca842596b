//! Logging initialization.
//!
//! - `FLOWSTATE_LOG_FORMAT=json`: structured JSON lines for log aggregation
//! - otherwise: human-readable, colored when stderr is a terminal
//!
//! Logs go to stderr; stdout carries command output only. Filtering follows
//! `RUST_LOG`, defaulting to `info`.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FORMAT_VAR: &str = "FLOWSTATE_LOG_FORMAT";

pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var(FORMAT_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(std::io::stderr().is_terminal())
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
