//! Project configuration from `pagewright.toml`.
//!
//! The file is optional; every field has a default.
//!
//! # Sections
//!
//! | Section     | Purpose                                         |
//! |-------------|-------------------------------------------------|
//! | `[build]`   | Extensions, output directory, verbatim copies   |
//! | `[bundler]` | External client bundler command                 |
//!
//! # Example
//!
//! ```toml
//! [build]
//! template_ext = "pw"
//! module_ext = "js"
//! output = ".pagewright"
//! copy_dirs = ["assets", "public"]
//!
//! [bundler]
//! enable = true
//! command = ["esbuild"]
//! minify = false
//! ```

pub mod defaults;
mod error;

pub use error::ConfigError;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing pagewright.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Path the config was loaded from (empty when defaults are used)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Client bundler settings
    #[serde(default)]
    pub bundler: BundlerConfig,
}

/// `[build]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Extension of template source files (without dot).
    #[serde(default = "defaults::build::template_ext")]
    #[educe(Default = defaults::build::template_ext())]
    pub template_ext: String,

    /// Extension of transpiled modules (without dot).
    #[serde(default = "defaults::build::module_ext")]
    #[educe(Default = defaults::build::module_ext())]
    pub module_ext: String,

    /// Output directory for directory builds.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Directories copied verbatim into the output root.
    #[serde(default = "defaults::build::copy_dirs")]
    #[educe(Default = defaults::build::copy_dirs())]
    pub copy_dirs: Vec<String>,
}

/// `[bundler]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BundlerConfig {
    /// Run the bundler when client components were found.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Bundler command and leading arguments.
    #[serde(default = "defaults::bundler::command")]
    #[educe(Default = defaults::bundler::command())]
    pub command: Vec<String>,

    /// Pass `--minify` to the bundler.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,
}

impl ProjectConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Load the config named on the command line, falling back to defaults
    /// when the file does not exist.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = if cli.config.exists() {
            Self::from_path(&cli.config)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let output = match &cli.command {
            Commands::Build { output, .. } | Commands::Clean { output } => output.as_ref(),
        };
        if let Some(output) = output {
            self.build.output = output.clone();
        }
    }

    /// File name marking a routed page directory (`page.js`).
    pub fn page_marker(&self) -> String {
        format!("page.{}", self.build.module_ext)
    }

    /// File name marking a directory's layout (`layout.js`).
    pub fn layout_marker(&self) -> String {
        format!("layout.{}", self.build.module_ext)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (field, ext) in [
            ("[build.template_ext]", &self.build.template_ext),
            ("[build.module_ext]", &self.build.module_ext),
        ] {
            if ext.is_empty() {
                bail!(ConfigError::Validation(format!("{field} must not be empty")));
            }
            if ext.starts_with('.') {
                bail!(ConfigError::Validation(format!(
                    "{field} must not start with a dot"
                )));
            }
        }

        if self.build.template_ext == self.build.module_ext {
            bail!(ConfigError::Validation(
                "[build.template_ext] and [build.module_ext] must differ".into()
            ));
        }

        if self.bundler.enable && self.bundler.command.is_empty() {
            bail!(ConfigError::Validation(
                "[bundler.command] must have at least one element".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
