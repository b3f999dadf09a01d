//! Pagewright - transpiles `.pw` templates into ES modules, a route table
//! and a client component bundle.

mod build;
mod cli;
mod compiler;
mod config;
mod error;
mod logger;
mod manifest;
mod paths;
mod routes;
mod template;
mod utils;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::ProjectConfig;
use error::{BuildError, STRUCTURAL_EXIT_CODE};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::set_verbose(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = ProjectConfig::load(cli)?;
    if !config.config_path.as_os_str().is_empty() {
        log_file!("build"; "config {}", config.config_path.display());
    }

    match &cli.command {
        Commands::Build { path, output } => build::run(path, output.as_deref(), &config),
        Commands::Clean { .. } => build::clean(&config.build.output),
    }
}

/// Structural errors get their own code; everything else is `1`.
fn exit_code(err: &anyhow::Error) -> u8 {
    let structural = err
        .downcast_ref::<BuildError>()
        .is_some_and(BuildError::is_structural);
    if structural { STRUCTURAL_EXIT_CODE } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let structural = anyhow::Error::from(BuildError::NotFound(PathBuf::from("x")));
        assert_eq!(exit_code(&structural), STRUCTURAL_EXIT_CODE);

        let validation = anyhow::Error::from(BuildError::Validation {
            path: PathBuf::from("routes.js"),
            message: "unclosed `[`".into(),
        });
        assert_eq!(exit_code(&validation), 1);

        assert_eq!(exit_code(&anyhow::anyhow!("build finished with errors")), 1);
    }
}
