// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global tracing subscriber: an `EnvFilter` read from
/// `RUST_LOG` (defaulting to `info`, or `debug` when `debug` is set),
/// formatted with thread ids so per-actor task interleaving is visible in the
/// log output.
pub fn setup_logging_and_tracing(debug: bool) {
	let default_level = if debug { "debug" } else { "info" };
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
		.with(tracing_subscriber::fmt::layer().with_thread_ids(true))
		.init();
}
