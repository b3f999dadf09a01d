//! Route discovery over the transpiled `pages` tree.
//!
//! ```text
//! <out>/pages/page.js            ──► { path: "/",     page: "pages/page" }
//! <out>/pages/blog/page.js       ──► { path: "/blog", page: "pages/blog/page",
//! <out>/pages/blog/layout.js             layout: "pages/blog/layout" }
//! ```
//!
//! Markers are detected by existence only. A layout applies to the route of
//! its own directory; descendants without their own layout get none.

mod emit;
mod validate;

pub use emit::{BOOTSTRAP_FILE, ROUTES_FILE, emit};

use crate::paths::{relativize, to_slash};
use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

/// One routed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// URL path, `/` for the scan root.
    pub path: String,
    /// Output-root-relative page reference without extension.
    pub page: String,
    /// Layout reference of the same directory, if any.
    pub layout: Option<String>,
}

/// Scan `pages_dir` for page and layout markers.
///
/// References are made relative to `output_root`. A missing `pages_dir`
/// yields no routes.
pub fn scan(
    output_root: &Path,
    pages_dir: &Path,
    page_marker: &str,
    layout_marker: &str,
) -> Result<Vec<Route>> {
    if !pages_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut scanner = Scanner {
        output_root,
        page_marker,
        layout_marker,
        layouts: Vec::new(),
        routes: Vec::new(),
    };
    scanner.visit(pages_dir, &mut Vec::new())?;
    Ok(scanner.routes)
}

struct Scanner<'a> {
    output_root: &'a Path,
    page_marker: &'a str,
    layout_marker: &'a str,
    /// `(depth, layout reference)`, innermost last.
    layouts: Vec<(usize, String)>,
    routes: Vec<Route>,
}

impl Scanner<'_> {
    fn visit(&mut self, dir: &Path, segments: &mut Vec<String>) -> Result<()> {
        let depth = segments.len();

        let pushed = dir.join(self.layout_marker).is_file();
        if pushed {
            let layout = self.reference(dir, self.layout_marker);
            self.layouts.push((depth, layout));
        }

        if dir.join(self.page_marker).is_file() {
            self.routes.push(Route {
                path: format!("/{}", segments.join("/")),
                page: self.reference(dir, self.page_marker),
                layout: self.layout_at(depth),
            });
        }

        let children = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in children {
            let entry = entry.with_context(|| format!("Failed to read `{}`", dir.display()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            segments.push(entry.file_name().to_string_lossy().into_owned());
            let result = self.visit(entry.path(), segments);
            segments.pop();
            result?;
        }

        if pushed {
            self.layouts.pop();
        }
        Ok(())
    }

    /// Layout bound to a route at `depth`: only one pushed at that depth.
    fn layout_at(&self, depth: usize) -> Option<String> {
        self.layouts
            .last()
            .filter(|(at, _)| *at == depth)
            .map(|(_, layout)| layout.clone())
    }

    fn reference(&self, dir: &Path, marker: &str) -> String {
        let file = dir.join(marker).with_extension("");
        to_slash(&relativize(self.output_root, &file))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export default () => \"\";").unwrap();
    }

    fn scan_root(root: &Path) -> Vec<Route> {
        scan(root, &root.join("pages"), "page.js", "layout.js").unwrap()
    }

    fn find<'a>(routes: &'a [Route], path: &str) -> &'a Route {
        routes
            .iter()
            .find(|route| route.path == path)
            .unwrap_or_else(|| panic!("no route for {path}"))
    }

    #[test]
    fn test_root_and_blog() {
        let out = TempDir::new().unwrap();
        touch(out.path(), "pages/page.js");
        touch(out.path(), "pages/blog/page.js");
        touch(out.path(), "pages/blog/layout.js");

        let routes = scan_root(out.path());
        assert_eq!(routes.len(), 2);

        let root = find(&routes, "/");
        assert_eq!(root.page, "pages/page");
        assert_eq!(root.layout, None);

        let blog = find(&routes, "/blog");
        assert_eq!(blog.page, "pages/blog/page");
        assert_eq!(blog.layout.as_deref(), Some("pages/blog/layout"));
    }

    #[test]
    fn test_nested_url() {
        let out = TempDir::new().unwrap();
        touch(out.path(), "pages/a/b/page.js");

        let routes = scan_root(out.path());
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/a/b");
        assert_eq!(routes[0].page, "pages/a/b/page");
    }

    #[test]
    fn test_layouts_are_not_inherited() {
        let out = TempDir::new().unwrap();
        touch(out.path(), "pages/layout.js");
        touch(out.path(), "pages/page.js");
        touch(out.path(), "pages/docs/page.js");
        touch(out.path(), "pages/docs/api/layout.js");
        touch(out.path(), "pages/docs/api/page.js");
        touch(out.path(), "pages/docs/api/v1/page.js");

        let routes = scan_root(out.path());
        assert_eq!(routes.len(), 4);
        assert_eq!(find(&routes, "/").layout.as_deref(), Some("pages/layout"));
        assert_eq!(find(&routes, "/docs").layout, None);
        assert_eq!(find(&routes, "/docs/api").layout.as_deref(), Some("pages/docs/api/layout"));
        assert_eq!(find(&routes, "/docs/api/v1").layout, None);
    }

    #[test]
    fn test_n_pages_m_layouts() {
        let out = TempDir::new().unwrap();
        let dirs = ["", "x", "x/y", "z", "z/w", "z/w/v"];
        let with_layout = ["x", "z/w", "z/w/v", "q"];

        for dir in dirs {
            touch(out.path(), &format!("pages/{dir}/page.js").replace("//", "/"));
        }
        for dir in with_layout {
            touch(out.path(), &format!("pages/{dir}/layout.js"));
        }

        let routes = scan_root(out.path());
        assert_eq!(routes.len(), dirs.len());
        for route in &routes {
            let dir = route.path.trim_start_matches('/');
            assert_eq!(route.layout.is_some(), with_layout.contains(&dir), "{}", route.path);
        }
    }

    #[test]
    fn test_layout_without_page_and_other_files() {
        let out = TempDir::new().unwrap();
        touch(out.path(), "pages/about/layout.js");
        touch(out.path(), "pages/about/photo.png");

        assert!(scan_root(out.path()).is_empty());
    }

    #[test]
    fn test_missing_pages_dir() {
        let out = TempDir::new().unwrap();
        assert!(scan_root(out.path()).is_empty());
    }
}
