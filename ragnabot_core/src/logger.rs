//! Tracing setup, called once by the binary before anything logs.

use std::io::stderr;

use anyhow::{Result as AResult, anyhow};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over `level` when both are set
pub fn init(level: &str) -> AResult<()> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(level))
		.map_err(|err| anyhow!("invalid log level '{level}': {err}"))?;
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(stderr)
		.try_init()
		.map_err(|err| anyhow!("failed to set subscriber: {err}"))
}
