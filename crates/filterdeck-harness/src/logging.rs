//! Subscriber setup for the harness binary.
//!
//! Filter directives come from `FILTERDECK_LOG`, then `RUST_LOG`, and default
//! to `warn`. Logs go to stderr so stdout stays clean JSONL.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::error::{HarnessError, Result};

pub const LOG_ENV: &str = "FILTERDECK_LOG";

const DEFAULT_DIRECTIVES: &str = "warn";

/// Directives from the environment, or the default.
#[must_use]
pub fn directives() -> String {
    [LOG_ENV, EnvFilter::DEFAULT_ENV]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_owned())
}

/// Install the global subscriber. `json` switches stderr to one JSON object
/// per event.
pub fn init(json: bool) -> Result<()> {
    let filter = EnvFilter::try_new(directives()).map_err(|e| HarnessError::Logging {
        message: e.to_string(),
    })?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| HarnessError::Logging {
        message: e.to_string(),
    })
}
