//! Verbatim copy of static directories (`assets`, `public`, ...).

use super::{is_ignored, is_within, walk::copy_file};
use crate::{log, log_file};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copy each directory named in `names` into `output_dir/<name>`.
///
/// A directory is looked up beside the source root first, then inside it.
/// Missing directories are skipped silently; copy failures are warnings.
/// Returns the number of files copied.
pub fn copy_verbatim_dirs(source_dir: &Path, output_dir: &Path, names: &[String]) -> usize {
    names
        .iter()
        .filter_map(|name| locate(source_dir, name).map(|dir| (name, dir)))
        .map(|(name, dir)| copy_dir(&dir, &output_dir.join(name), output_dir))
        .sum()
}

fn locate(source_dir: &Path, name: &str) -> Option<PathBuf> {
    let beside = source_dir.parent().map(|parent| parent.join(name));
    let inside = Some(source_dir.join(name));

    [beside, inside].into_iter().flatten().find(|dir| dir.is_dir())
}

fn copy_dir(src: &Path, dst: &Path, output_dir: &Path) -> usize {
    let mut copied = 0;

    let entries = WalkDir::new(src)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_within(output_dir, e.path()));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log!("warn"; "skipping unreadable entry in `{}`: {err}", src.display());
                continue;
            }
        };
        if !entry.file_type().is_file() || is_ignored(&entry) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };

        match copy_file(entry.path(), &dst.join(relative)) {
            Ok(()) => {
                log_file!("assets"; "{}", entry.path().display());
                copied += 1;
            }
            Err(err) => log!("warn"; "cannot copy `{}`: {err}", entry.path().display()),
        }
    }

    copied
}
