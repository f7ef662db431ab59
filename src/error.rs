//! Error types for geogrid.
//!
//! Index operations never fail; only configuration and its loading do.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoGridError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[cfg(feature = "toml")]
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, GeoGridError>;
