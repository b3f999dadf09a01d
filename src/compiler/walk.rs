//! Recursive source tree walk.

use super::{PAGES_DIR, TranspileContext, Transpiled, assets, is_ignored, is_within};
use crate::{log, log_file, manifest::ClientComponentRef};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// What one walk did.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Templates written as modules.
    pub transpiled: usize,
    /// Templates skipped by the client directive.
    pub client_only: usize,
    /// Files copied verbatim (co-located page assets and copy dirs).
    pub copied: usize,
    /// Per-file failures, in walk order.
    pub failed: Vec<(PathBuf, String)>,
}

impl WalkReport {
    fn fail(&mut self, path: &Path, message: String) {
        log!("error"; "{message}");
        self.failed.push((path.to_path_buf(), message));
    }
}

/// Walk `source_dir`, mirroring it into `output_dir`.
///
/// Templates are transpiled, other files under a `pages` segment are copied
/// as-is, everything else is ignored. Anything inside `output_dir` is never
/// read, even when it is nested in `source_dir`. Failures are recorded and
/// the walk continues. Afterwards each of `copy_dirs` is copied into the
/// output root.
pub fn walk(
    ctx: &TranspileContext<'_>,
    source_dir: &Path,
    output_dir: &Path,
    copy_dirs: &[String],
    components: &mut Vec<ClientComponentRef>,
) -> WalkReport {
    let mut report = WalkReport::default();

    let entries = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_within(output_dir, e.path()));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(source_dir).to_path_buf();
                report.fail(&path, format!("cannot read `{}`: {err}", path.display()));
                continue;
            }
        };
        if !entry.file_type().is_file() || is_ignored(&entry) {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(source_dir) else {
            continue;
        };

        if path.extension().is_some_and(|ext| ext == ctx.template_ext) {
            let dst = ctx.output_path(relative, output_dir);
            match ctx.transpile_file(path, &dst, components) {
                Ok(Transpiled::Module(_)) => {
                    log_file!("transpile"; "{}", relative.display());
                    report.transpiled += 1;
                }
                Ok(Transpiled::ClientOnly) => {
                    log_file!("transpile"; "{} (client only, skipped)", relative.display());
                    report.client_only += 1;
                }
                Err(err) => report.fail(path, format!("{:#}", anyhow::Error::from(err))),
            }
        } else if under_pages(relative) {
            let dst = output_dir.join(relative);
            match copy_file(path, &dst) {
                Ok(()) => {
                    log_file!("assets"; "{}", relative.display());
                    report.copied += 1;
                }
                Err(err) => report.fail(path, format!("cannot copy `{}`: {err}", path.display())),
            }
        }
    }

    report.copied += assets::copy_verbatim_dirs(source_dir, output_dir, copy_dirs);
    report
}

/// True when a directory component of `relative` is named `pages`.
fn under_pages(relative: &Path) -> bool {
    relative
        .parent()
        .is_some_and(|dir| dir.iter().any(|segment| segment == PAGES_DIR))
}

pub(super) fn copy_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst).map(|_| ())
}

// ============================================================================
// Tests
// ============================================================================
