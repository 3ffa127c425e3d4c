use thiserror::Error;

/// Unified error type for the entire wealth-valuation-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Market data ─────────────────────────────────────────────────
    /// The ticker has no known mapping for the upstream that prices it.
    #[error("Unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    /// Network failure, non-2xx status or malformed body from a provider.
    #[error("Upstream unavailable ({provider}): {message}")]
    UpstreamUnavailable {
        provider: String,
        message: String,
    },

    /// The quote, asset or record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The asset type has no valuation semantics for the requested operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // ── Input ───────────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Infrastructure ──────────────────────────────────────────────
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    pub(crate) fn upstream(provider: &str, message: impl Into<String>) -> Self {
        CoreError::UpstreamUnavailable {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Whether the failure came from an upstream provider and may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::UpstreamUnavailable { .. })
    }
}

/// Strip query parameters from URLs inside an error message so API keys
/// embedded in request URLs never reach logs or callers.
pub(crate) fn redact_query(msg: &str) -> String {
    match msg.find('?') {
        Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
        None => msg.to_string(),
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::upstream("http", redact_query(&e.to_string()))
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(e: toml::de::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CoreError {
    fn from(e: redis::RedisError) -> Self {
        CoreError::Cache(e.to_string())
    }
}
