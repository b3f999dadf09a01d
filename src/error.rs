//! Build error types.
//!
//! Per-unit failures (`TranspileError`) are logged and the walk moves on.
//! `BuildError::InvalidExtension` and `BuildError::NotFound` are structural
//! and abort the run with [`STRUCTURAL_EXIT_CODE`].

use crate::template::SyntaxError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for structural errors, distinct from ordinary failures (`1`).
pub const STRUCTURAL_EXIT_CODE: u8 = 2;

/// Failure transpiling a single template file.
#[derive(Debug, Error)]
pub enum TranspileError {
    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    /// Not a `source`: the parser message is already in the display.
    #[error("syntax error in `{path}`: {error}")]
    Syntax { path: PathBuf, error: SyntaxError },
}

/// Failure of a build step or of the invocation itself.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("`{path}` is not a `.{expected}` template")]
    InvalidExtension { path: PathBuf, expected: String },

    #[error("`{0}` is neither a file nor a directory")]
    NotFound(PathBuf),

    #[error("generated `{path}` failed validation: {message}")]
    Validation { path: PathBuf, message: String },

    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl BuildError {
    /// Structural errors abort immediately with a distinct exit code.
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::InvalidExtension { .. } | Self::NotFound(_))
    }
}
