//! Error types.
//!
//! Lookups on unknown page or block ids are never errors; they are silent
//! no-ops so a message racing a page removal cannot take the host down.
//! The types here cover input that is genuinely malformed.

/// A bridge payload that could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The payload was not valid JSON or did not match a known message shape.
    #[error("malformed bridge message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Settings that failed to load.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse or schema error
    #[error("invalid settings (toml): {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse or schema error
    #[error("invalid settings (json): {0}")]
    Json(#[from] serde_json::Error),

    /// A value parsed but is out of range
    #[error("invalid setting `{field}`: {reason}")]
    OutOfRange {
        /// Offending key
        field: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },
}

/// An alias that would make a route resolve to two pages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("route `{route}` already belongs to page `{owner}`")]
pub struct RouteConflict {
    /// The contested route string
    pub route: String,
    /// The page currently holding it
    pub owner: String,
}
