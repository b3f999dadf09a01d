//! Source tree compilation.
//!
//! ```text
//! walk() ──► transpile::TranspileContext ──► <out>/**/*.js
//!   │                   │
//!   │                   └──► ClientComponentRef[]
//!   └──► verbatim copy (pages/**, copy_dirs)
//! ```

pub mod assets;
pub mod transpile;
mod walk;

pub use transpile::{TranspileContext, Transpiled};
pub use walk::walk;

use std::path::Path;
use walkdir::DirEntry;

/// Name of the routed subtree, in both the source and output trees.
pub const PAGES_DIR: &str = "pages";

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

fn is_ignored(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| IGNORED_FILES.contains(&name))
}

/// True when `path` is `dir` itself or lies inside it.
fn is_within(dir: &Path, path: &Path) -> bool {
    path == dir || crate::paths::containment(dir, path).is_some()
}
