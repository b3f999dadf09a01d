//! `pagewright.toml` errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid pagewright.toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// Field-level check failure; the message names the `[section.field]`.
    #[error("invalid pagewright.toml: {0}")]
    Validation(String),
}
