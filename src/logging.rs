//! Logging setup
//!
//! The walkers log one line per entry processed, per skip and per failure
//! through the `tracing` macros. This module installs the subscriber that
//! prints them.

/// Initialize the tracing subscriber with environment filter support.
///
/// `default_level` applies when `RUST_LOG` is not set:
///
/// ```bash
/// RUST_LOG=debug dirmirror
/// RUST_LOG=dirmirror::session=debug,dirmirror=info dirmirror
/// ```
pub fn init_tracing(default_level: &str) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

	// A second init (e.g. from tests) keeps the first subscriber
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.try_init();
}


// vim: ts=4
