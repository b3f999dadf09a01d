//! Client component manifest.
//!
//! Collects every client component reference found during one build and
//! turns it into the browser bundle:
//!
//! ```text
//! ClientComponentRef[] ──► interchange text ──► assets/client-entry.js ──► bundler ──► assets/client.js
//! ```
//!
//! The manifest is rebuilt from scratch each build. References are never
//! de-duplicated: a component used from two files appears twice.

mod bundle;
mod interchange;

pub use bundle::{BundleOutcome, run_bundler};
pub use interchange::Value;

use crate::config::BundlerConfig;
use anyhow::{Context, Result, bail};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Output subdirectory holding the client entry and bundle.
pub const CLIENT_DIR: &str = "assets";
/// Client entry file inside [`CLIENT_DIR`].
pub const CLIENT_ENTRY: &str = "client-entry.js";
/// Bundled output inside [`CLIENT_DIR`].
pub const CLIENT_BUNDLE: &str = "client.js";
/// Token in the client template replaced by the interchange text.
pub const PLACEHOLDER: &str = "__PAGEWRIGHT_COMPONENTS__";

/// Browser bootstrap template.
const CLIENT_TEMPLATE: &str = include_str!("../embed/client.js");

/// A client component usage discovered while transpiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientComponentRef {
    pub id: String,
    /// Name the component was imported under.
    pub name: String,
    /// Source path relative to the input root (`components/counter.pw`).
    pub source_path: String,
    /// Transpiled module path relative to the output root (`components/counter.js`).
    pub import_path: String,
    /// Lazy import, relative to [`CLIENT_DIR`] (`() => import("../components/counter.js")`).
    pub import_expr: String,
}

/// What [`aggregate`] did.
#[derive(Debug)]
pub enum ManifestOutcome {
    /// No references: nothing written, bundler not run.
    Empty,
    Written {
        entry: PathBuf,
        /// `None` when the bundler is disabled.
        bundle: Option<BundleOutcome>,
    },
}

/// Ordered interchange array: `{id, name, path, import}` per reference.
pub fn to_interchange(components: &[ClientComponentRef]) -> Value {
    Value::Array(
        components
            .iter()
            .map(|c| {
                Value::Object(vec![
                    ("id".into(), Value::Str(c.id.clone())),
                    ("name".into(), Value::Str(c.name.clone())),
                    ("path".into(), Value::Str(c.source_path.clone())),
                    ("import".into(), Value::Raw(c.import_expr.clone())),
                ])
            })
            .collect(),
    )
}

/// Substitute `interchange` for the single placeholder in `template`.
pub fn render_entry(template: &str, interchange: &str) -> Result<String> {
    let count = template.matches(PLACEHOLDER).count();
    if count != 1 {
        bail!("client template must contain `{PLACEHOLDER}` exactly once, found {count}");
    }
    Ok(template.replacen(PLACEHOLDER, interchange, 1))
}

/// Write the client entry for `components` under `output_root` and run the
/// bundler on it.
///
/// An empty list is a no-op. Bundler failures are reported in the outcome,
/// not as errors.
pub fn aggregate(
    components: &[ClientComponentRef],
    output_root: &Path,
    bundler: &BundlerConfig,
) -> Result<ManifestOutcome> {
    if components.is_empty() {
        return Ok(ManifestOutcome::Empty);
    }

    let interchange = to_interchange(components).render();
    let source = render_entry(CLIENT_TEMPLATE, &interchange)?;

    let client_dir = output_root.join(CLIENT_DIR);
    fs::create_dir_all(&client_dir)
        .with_context(|| format!("Failed to create `{}`", client_dir.display()))?;

    let entry = client_dir.join(CLIENT_ENTRY);
    fs::write(&entry, source).with_context(|| format!("Failed to write `{}`", entry.display()))?;

    let bundle = bundler.enable.then(|| {
        run_bundler(bundler, output_root, &entry, &client_dir.join(CLIENT_BUNDLE))
    });

    Ok(ManifestOutcome::Written { entry, bundle })
}

// ============================================================================
// Tests
// ============================================================================
