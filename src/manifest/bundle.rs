//! External bundler invocation.
//!
//! The bundler runs once, synchronously, with its output captured. The
//! result is reported as a [`BundleOutcome`]; whether a failure matters is
//! up to the caller.

use crate::{
    config::BundlerConfig,
    exec,
    utils::exec::diagnostics,
};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleOutcome {
    Success,
    /// The configured command is missing or could not be started.
    ToolingUnavailable { command: String },
    /// The bundler ran and failed.
    NonZeroExit { status: String, diagnostics: String },
}

impl BundleOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Bundle `entry` into `outfile`, running from `root`.
///
/// Invoked as `<command...> <entry> --bundle --format=esm --outfile=<outfile> [--minify]`.
pub fn run_bundler(config: &BundlerConfig, root: &Path, entry: &Path, outfile: &Path) -> BundleOutcome {
    let Some(program) = config.command.first() else {
        return BundleOutcome::ToolingUnavailable {
            command: String::new(),
        };
    };

    if which::which(program).is_err() {
        return BundleOutcome::ToolingUnavailable {
            command: program.clone(),
        };
    }

    let result = exec!(
        root;
        &config.command;
        entry,
        "--bundle",
        "--format=esm",
        format!("--outfile={}", outfile.display()),
        if config.minify { "--minify" } else { "" }
    );

    match result {
        Ok(output) if output.status.success() => BundleOutcome::Success,
        Ok(output) => BundleOutcome::NonZeroExit {
            status: output.status.to_string(),
            diagnostics: diagnostics(&output),
        },
        Err(_) => BundleOutcome::ToolingUnavailable {
            command: program.clone(),
        },
    }
}
