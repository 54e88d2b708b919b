//! Tracing subscriber setup
//!
//! The client only emits `tracing` events; applications that want them on
//! stderr call [`init_tracing`] once at startup. `RUST_LOG` takes precedence
//! over the filter passed in.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use digirest_domain::{DigirestError, Result};

/// Output style of the stderr log layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Filter string used when neither `RUST_LOG` nor the caller provide one
pub const DEFAULT_FILTER: &str = "warn,digirest_core=info,digirest_infra=info";

/// Resolve the effective filter: `RUST_LOG`, then `fallback`, then `warn`
pub fn resolve_filter(fallback: Option<&str>) -> EnvFilter {
    let base = std::env::var("RUST_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.unwrap_or(DEFAULT_FILTER).to_string());
    EnvFilter::try_new(&base).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber.
///
/// # Errors
/// Returns `Config` when a global subscriber is already installed
pub fn init_tracing(filter: Option<&str>, format: LogFormat) -> Result<()> {
    let layer = match format {
        LogFormat::Compact => fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .compact()
            .boxed(),
        LogFormat::Json => fmt::layer().with_writer(std::io::stderr).json().boxed(),
    };

    tracing_subscriber::registry()
        .with(resolve_filter(filter))
        .with(layer)
        .try_init()
        .map_err(|e| DigirestError::Config(format!("tracing already initialized: {e}")))
}
