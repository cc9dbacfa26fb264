// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tracing subscriber setup for test harnesses driving the pool.

use tracing::debug;

/// Install the global tracing subscriber.
///
/// Format: timestamp file:line LEVEL message
///
/// Respects `RUST_LOG` if set, otherwise defaults to INFO level, and
/// `RUST_LOG_FORMAT` (`json` or text) for the output format.
///
/// Returns `false` when a global subscriber was already installed, which is the
/// normal case when several test binaries or test functions call this.
pub fn init_tracing() -> bool {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let installed = match log_format.to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_target(false)
            .json()
            .try_init()
            .is_ok(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_target(false)
            .with_ansi(true)
            .compact()
            .try_init()
            .is_ok(),
    };

    if installed {
        debug!("Logging initialized with file and line number tracking");
    }
    installed
}
