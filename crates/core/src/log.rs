use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::errors::CoreError;

/// Install a global fmt subscriber for hosts that do not bring their own.
///
/// A `RUST_LOG` directive replaces the built-in filter entirely. Without one
/// the engine logs at `info`, or at `debug` when `verbose` (cache hits and
/// misses show up there), and other crates at `warn`. Returns a `Config`
/// error if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<(), CoreError> {
    let (env_filter, engine_filter) = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => (Some(env_filter), None),
        Err(_) => (None, Some(default_filter(verbose))),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(engine_filter)
        .with(env_filter)
        .try_init()
        .map_err(|e| CoreError::Config(format!("logging already initialised: {e}")))
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> Targets {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    Targets::new()
        .with_target("wealth_valuation_core", level)
        .with_default(LevelFilter::WARN)
}
