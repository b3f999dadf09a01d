//! Build orchestration.
//!
//! # Architecture
//!
//! ```text
//! run(path)
//!     │
//!     ├── file ──► build_file() ──► stdout | <output>/<stem>.js
//!     │
//!     └── dir  ──► build_dir()
//!                     │
//!                     ├── compiler::walk()       ──► modules + ClientComponentRef[]
//!                     ├── routes::scan/emit()    ──► routes.js + main.js
//!                     └── manifest::aggregate()  ──► assets/client-entry.js ──► bundler
//! ```
//!
//! Everything runs on one thread; the reference list is created here and
//! dropped at the end of the build.

use crate::{
    compiler::{self, PAGES_DIR, TranspileContext, Transpiled},
    config::ProjectConfig,
    error::BuildError,
    log, log_file,
    manifest::{self, BundleOutcome, CLIENT_BUNDLE, CLIENT_DIR, ManifestOutcome},
    paths::{containment, resolve},
    routes,
    template::MarkupParser,
};
use anyhow::{Context, Result, bail};
use std::{
    fs,
    io::{Write, stdout},
    path::{Path, PathBuf},
};

/// Outcome of the route table step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteStatus {
    /// Table written with this many routes.
    Emitted(usize),
    /// No `pages` directory in the output tree.
    NoPages,
    /// A `pages` directory without page markers.
    NoRoutes,
    Failed(String),
}

/// Summary of one directory build.
#[derive(Debug)]
pub struct BuildReport {
    pub transpiled: usize,
    /// Templates skipped by the client directive.
    pub skipped: usize,
    pub copied: usize,
    pub failed: Vec<(PathBuf, String)>,
    pub routes: RouteStatus,
    /// Client component references collected across the walk.
    pub components: usize,
    /// `None` when no bundler ran.
    pub bundle: Option<BundleOutcome>,
}

impl BuildReport {
    /// No unit failed. Warnings (missing bundler, no routes) don't count.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !matches!(self.routes, RouteStatus::Failed(_))
    }

    fn summary(&self) -> String {
        let routes = match &self.routes {
            RouteStatus::Emitted(n) => n.to_string(),
            RouteStatus::NoPages | RouteStatus::NoRoutes => "0".to_owned(),
            RouteStatus::Failed(_) => "failed".to_owned(),
        };
        let bundle = match &self.bundle {
            None => "none",
            Some(BundleOutcome::Success) => "built",
            Some(_) => "not built",
        };
        format!(
            "{} transpiled, {} skipped, {} copied, {} failed, routes: {routes}, client components: {}, bundle: {bundle}",
            self.transpiled,
            self.skipped,
            self.copied,
            self.failed.len(),
            self.components
        )
    }
}

/// Build `path`, a template file or a project directory.
///
/// `output` is the explicit `--output` flag; directory builds fall back to
/// `[build] output`, file builds to stdout.
pub fn run(path: &Path, output: Option<&Path>, config: &ProjectConfig) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let source = resolve(&cwd, path);

    if source.is_file() {
        let output = output.map(|dir| resolve(&cwd, dir));
        return build_file(&source, output.as_deref(), config);
    }
    if source.is_dir() {
        let report = build_dir(&source, &resolve(&cwd, &config.build.output), config)?;
        log!("build"; "{}", report.summary());
        if !report.is_success() {
            bail!("build finished with errors");
        }
        return Ok(());
    }

    Err(BuildError::NotFound(source).into())
}

/// Transpile a single template, without routes or manifest.
pub fn build_file(src: &Path, output: Option<&Path>, config: &ProjectConfig) -> Result<()> {
    let build = &config.build;
    if src.extension().is_none_or(|ext| ext != build.template_ext.as_str()) {
        return Err(BuildError::InvalidExtension {
            path: src.to_path_buf(),
            expected: build.template_ext.clone(),
        }
        .into());
    }

    let parser = MarkupParser::new(&build.template_ext, &build.module_ext);
    let input_root = src.parent().unwrap_or(Path::new("."));
    let ctx = TranspileContext {
        parser: &parser,
        input_root,
        template_ext: &build.template_ext,
        module_ext: &build.module_ext,
    };
    let mut components = Vec::new();

    let Some(dir) = output else {
        if let Transpiled::Module(code) = ctx.transpile_source(src, &mut components)? {
            let mut out = stdout().lock();
            out.write_all(code.as_bytes())
                .and_then(|()| out.flush())
                .context("Failed to write to stdout")?;
        } else {
            log!("warn"; "`{}` is client only, nothing emitted", src.display());
        }
        return Ok(());
    };

    let file_name = src.file_name().map(PathBuf::from).unwrap_or_default();
    let dst = ctx.output_path(&file_name, dir);
    match ctx.transpile_file(src, &dst, &mut components)? {
        Transpiled::Module(_) => log!("build"; "{}", dst.display()),
        Transpiled::ClientOnly => log!("warn"; "`{}` is client only, nothing emitted", src.display()),
    }
    Ok(())
}

/// Build the project rooted at `source` into `output`.
///
/// Only an unusable output directory is an error; per-file and per-step
/// failures end up in the report.
pub fn build_dir(source: &Path, output: &Path, config: &ProjectConfig) -> Result<BuildReport> {
    let build = &config.build;
    if output == source || containment(output, source).is_some() {
        bail!(
            "output `{}` must not contain the source directory `{}`",
            output.display(),
            source.display()
        );
    }
    fs::create_dir_all(output).map_err(|err| BuildError::Io(output.to_path_buf(), err))?;

    log!("build"; "{} -> {}", source.display(), output.display());

    let parser = MarkupParser::new(&build.template_ext, &build.module_ext);
    let ctx = TranspileContext {
        parser: &parser,
        input_root: source,
        template_ext: &build.template_ext,
        module_ext: &build.module_ext,
    };
    let mut components = Vec::new();

    let walk = compiler::walk(&ctx, source, output, &build.copy_dirs, &mut components);
    let mut report = BuildReport {
        transpiled: walk.transpiled,
        skipped: walk.client_only,
        copied: walk.copied,
        failed: walk.failed,
        routes: emit_routes(output, config),
        components: components.len(),
        bundle: None,
    };

    match manifest::aggregate(&components, output, &config.bundler) {
        Ok(ManifestOutcome::Empty) => log!("manifest"; "no client components"),
        Ok(ManifestOutcome::Written { entry, bundle }) => {
            for component in &components {
                log_file!("manifest"; "{} ({}) -> {}", component.name, component.id, component.import_path);
            }
            log!("manifest"; "{} client components -> {}", components.len(), entry.display());
            if let Some(outcome) = &bundle {
                report_bundle(outcome, &output.join(CLIENT_DIR).join(CLIENT_BUNDLE));
            }
            report.bundle = bundle;
        }
        Err(err) => {
            log!("error"; "{err:#}");
            report.failed.push((output.join(CLIENT_DIR), format!("{err:#}")));
        }
    }

    Ok(report)
}

fn emit_routes(output: &Path, config: &ProjectConfig) -> RouteStatus {
    let pages_dir = output.join(PAGES_DIR);
    if !pages_dir.is_dir() {
        log!("warn"; "no `{PAGES_DIR}` directory, route table not generated");
        return RouteStatus::NoPages;
    }

    let scanned = routes::scan(
        output,
        &pages_dir,
        &config.page_marker(),
        &config.layout_marker(),
    );
    let routes = match scanned {
        Ok(routes) if routes.is_empty() => {
            log!("warn"; "no `{}` under `{}`, route table not generated", config.page_marker(), pages_dir.display());
            return RouteStatus::NoRoutes;
        }
        Ok(routes) => routes,
        Err(err) => {
            log!("error"; "{err:#}");
            return RouteStatus::Failed(format!("{err:#}"));
        }
    };

    match routes::emit(&routes, output, &config.build.module_ext) {
        Ok(path) => {
            log!("routes"; "{} routes -> {}", routes.len(), path.display());
            RouteStatus::Emitted(routes.len())
        }
        Err(err) => {
            log!("error"; "{err}");
            RouteStatus::Failed(err.to_string())
        }
    }
}

fn report_bundle(outcome: &BundleOutcome, bundle: &Path) {
    match outcome {
        BundleOutcome::Success => log!("bundle"; "{}", bundle.display()),
        BundleOutcome::ToolingUnavailable { command } => {
            log!("warn"; "bundler `{command}` not available, client bundle not built");
        }
        BundleOutcome::NonZeroExit {
            status,
            diagnostics,
        } if diagnostics.is_empty() => log!("warn"; "bundler failed ({status})"),
        BundleOutcome::NonZeroExit {
            status,
            diagnostics,
        } => log!("warn"; "bundler failed ({status}):\n{diagnostics}"),
    }
}

/// Remove the output directory.
pub fn clean(output: &Path) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let output = resolve(&cwd, output);

    if output == cwd || containment(&output, &cwd).is_some() {
        bail!("refusing to remove `{}`: it contains the working directory", output.display());
    }
    if !output.exists() {
        log!("build"; "nothing to clean");
        return Ok(());
    }

    fs::remove_dir_all(&output).map_err(|err| BuildError::Io(output.clone(), err))?;
    log!("build"; "removed {}", output.display());
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
