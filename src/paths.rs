//! Pure path algebra used by every build stage.
//!
//! Nothing in here touches the filesystem: paths are compared and rewritten
//! lexically, component by component, so results are deterministic and
//! separator-aware on every platform.
//!
//! ```text
//! resolve("/site/src", "../lib/a.pw")     → /site/lib/a.pw
//! relativize("/site/out/assets", "/site/out/x/y.js") → ../x/y.js
//! containment("/site", "/site/.out/a.js")  → Some(.out/a.js)
//! ```

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base_dir`.
///
/// Absolute input passes through untouched; relative input is joined onto
/// `base_dir` and normalized.
pub fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        normalize(&base_dir.join(path))
    }
}

/// Compute the relative path leading from `base` to `target`.
///
/// Identical paths yield `.`.
pub fn relativize(base: &Path, target: &Path) -> PathBuf {
    let base = normalize(base);
    let target = normalize(target);

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();

    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        relative
    }
}

/// Return the remainder of `candidate` below `dir`, if `candidate` is a
/// strict descendant of `dir`.
///
/// `candidate == dir` yields `None`.
pub fn containment(dir: &Path, candidate: &Path) -> Option<PathBuf> {
    let dir = normalize(dir);
    let candidate = normalize(candidate);

    candidate
        .strip_prefix(&dir)
        .ok()
        .filter(|rest| !rest.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment where one exists.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.into_iter().map(Component::as_os_str).collect()
}

/// Render a relative path with `/` separators, as used in import specifiers
/// and route references.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Turn a relative path into a module specifier (`./x.js`, `../x.js`).
pub fn to_specifier(path: &Path) -> String {
    let slashed = to_slash(path);
    if slashed.starts_with("../") || slashed == ".." {
        slashed
    } else {
        format!("./{slashed}")
    }
}

// ============================================================================
// Tests
// ============================================================================
