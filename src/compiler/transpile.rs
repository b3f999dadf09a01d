//! Single-file transpilation.
//!
//! ```text
//! pages/blog/page.pw ──► Parser ──► <out>/pages/blog/page.js
//!                          │
//!                          └──► ClientComponentRef[] (appended to the build's list)
//! ```

use crate::{
    error::TranspileError,
    manifest::{CLIENT_DIR, ClientComponentRef},
    paths::{relativize, resolve, to_slash, to_specifier},
    template::{ParseContext, Parser},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// First-line directive excluding a template from the server pass.
pub const CLIENT_DIRECTIVE: &str = "\"use client\"";

/// Read-only inputs shared by every file of one pass.
pub struct TranspileContext<'a> {
    pub parser: &'a dyn Parser,
    /// Root the output tree mirrors; references are made relative to it.
    pub input_root: &'a Path,
    pub template_ext: &'a str,
    pub module_ext: &'a str,
}

/// Result of transpiling one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transpiled {
    /// Generated module code.
    Module(String),
    /// The file starts with the client directive and produces nothing.
    ClientOnly,
}

impl TranspileContext<'_> {
    /// Transpile `src` in memory, appending its client component references
    /// to `components` on success.
    pub fn transpile_source(
        &self,
        src: &Path,
        components: &mut Vec<ClientComponentRef>,
    ) -> Result<Transpiled, TranspileError> {
        let source =
            fs::read_to_string(src).map_err(|err| TranspileError::Io(src.to_path_buf(), err))?;

        if has_client_directive(&source) {
            return Ok(Transpiled::ClientOnly);
        }

        let ctx = ParseContext {
            module_id: self.module_id(src),
        };
        let output = self
            .parser
            .parse(&source, &ctx)
            .map_err(|error| TranspileError::Syntax {
                path: src.to_path_buf(),
                error,
            })?;

        let src_dir = src.parent().unwrap_or(self.input_root);
        components.extend(
            output
                .components
                .iter()
                .map(|component| self.client_ref(src_dir, &component.id, &component.name, &component.path)),
        );

        Ok(Transpiled::Module(output.code))
    }

    /// Transpile `src` into `dst`, creating parent directories as needed.
    ///
    /// References are only appended once the module is on disk.
    pub fn transpile_file(
        &self,
        src: &Path,
        dst: &Path,
        components: &mut Vec<ClientComponentRef>,
    ) -> Result<Transpiled, TranspileError> {
        let mut found = Vec::new();
        let transpiled = self.transpile_source(src, &mut found)?;

        if let Transpiled::Module(code) = &transpiled {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)
                    .map_err(|err| TranspileError::Io(parent.to_path_buf(), err))?;
            }
            fs::write(dst, code).map_err(|err| TranspileError::Io(dst.to_path_buf(), err))?;
            components.append(&mut found);
        }

        Ok(transpiled)
    }

    /// Mirrored output path of a template: same relative location, module
    /// extension.
    pub fn output_path(&self, relative: &Path, output_root: &Path) -> PathBuf {
        output_root.join(relative).with_extension(self.module_ext)
    }

    /// Input-root-relative path without extension, e.g. `pages/blog/page`.
    fn module_id(&self, src: &Path) -> String {
        to_slash(&relativize(self.input_root, &src.with_extension("")))
    }

    fn client_ref(&self, src_dir: &Path, id: &str, name: &str, declared: &str) -> ClientComponentRef {
        let resolved = resolve(src_dir, Path::new(declared));
        let source_path = relativize(self.input_root, &resolved);

        let import_path = if source_path.extension().is_some_and(|ext| ext == self.template_ext) {
            source_path.with_extension(self.module_ext)
        } else {
            source_path.clone()
        };

        let specifier = to_specifier(&relativize(Path::new(CLIENT_DIR), &import_path));

        ClientComponentRef {
            id: id.to_owned(),
            name: name.to_owned(),
            source_path: to_slash(&source_path),
            import_path: to_slash(&import_path),
            import_expr: format!("() => import({})", quote_js(&specifier)),
        }
    }
}

/// True when the first non-blank line is exactly the client directive.
pub fn has_client_directive(source: &str) -> bool {
    source
        .lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.trim() == CLIENT_DIRECTIVE)
}

fn quote_js(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MarkupParser;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn with_ctx<R>(root: &Path, f: impl FnOnce(&TranspileContext<'_>) -> R) -> R {
        let parser = MarkupParser::new("pw", "js");
        let ctx = TranspileContext {
            parser: &parser,
            input_root: root,
            template_ext: "pw",
            module_ext: "js",
        };
        f(&ctx)
    }

    #[test]
    fn test_client_directive_detection() {
        assert!(has_client_directive("\"use client\"\n<p/>"));
        assert!(has_client_directive("\n   \n  \"use client\"  \n<p/>"));
        assert!(!has_client_directive("<p>\"use client\"</p>"));
        assert!(!has_client_directive("'use client'\n"));
        assert!(!has_client_directive(""));
    }

    #[test]
    fn test_transpile_file_writes_module_and_refs() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let src = write(
            input.path(),
            "pages/blog/page.pw",
            "---\nimport Counter from \"../../components/counter.pw\"\n---\n<Counter client />",
        );
        let dst = output.path().join("pages/blog/page.js");

        let mut components = Vec::new();
        let result = with_ctx(input.path(), |ctx| ctx.transpile_file(&src, &dst, &mut components));

        assert!(matches!(result, Ok(Transpiled::Module(_))));
        assert!(fs::read_to_string(&dst).unwrap().contains("data-island"));

        assert_eq!(components.len(), 1);
        let component = &components[0];
        assert_eq!(component.name, "Counter");
        assert_eq!(component.source_path, "components/counter.pw");
        assert_eq!(component.import_path, "components/counter.js");
        assert_eq!(component.import_expr, "() => import(\"../components/counter.js\")");
    }

    #[test]
    fn test_client_only_file_produces_nothing() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let src = write(
            input.path(),
            "components/counter.pw",
            "\"use client\"\n---\nimport X from \"./x.pw\"\n---\n<X client />",
        );
        let dst = output.path().join("components/counter.js");

        let mut components = Vec::new();
        let result = with_ctx(input.path(), |ctx| ctx.transpile_file(&src, &dst, &mut components));

        assert_eq!(result.unwrap(), Transpiled::ClientOnly);
        assert!(!dst.exists());
        assert!(components.is_empty());
    }

    #[test]
    fn test_syntax_error_contributes_nothing() {
        let input = TempDir::new().unwrap();
        let src = write(
            input.path(),
            "pages/page.pw",
            "---\nimport A from \"./a.pw\"\n---\n<A client />\n{oops",
        );
        let dst = input.path().join("out/page.js");

        let mut components = Vec::new();
        let err = with_ctx(input.path(), |ctx| ctx.transpile_file(&src, &dst, &mut components))
            .unwrap_err();

        assert!(matches!(err, TranspileError::Syntax { ref error, .. } if error.line == 5));
        assert!(components.is_empty());
        assert!(!dst.exists());
    }

    #[test]
    fn test_unreadable_source_is_io_error() {
        let input = TempDir::new().unwrap();
        let missing = input.path().join("missing.pw");

        let mut components = Vec::new();
        let err = with_ctx(input.path(), |ctx| ctx.transpile_source(&missing, &mut components))
            .unwrap_err();
        assert!(matches!(err, TranspileError::Io(path, _) if path == missing));
    }

    #[test]
    fn test_appends_to_existing_refs() {
        let input = TempDir::new().unwrap();
        let a = write(input.path(), "a.pw", "---\nimport C from \"./c.pw\"\n---\n<C client />");
        let b = write(input.path(), "b.pw", "---\nimport C from \"./c.pw\"\n---\n<C client />");

        let mut components = Vec::new();
        with_ctx(input.path(), |ctx| {
            ctx.transpile_source(&a, &mut components).unwrap();
            ctx.transpile_source(&b, &mut components).unwrap();
        });

        // Same component from two files: both kept, ids distinct
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].source_path, components[1].source_path);
        assert_ne!(components[0].id, components[1].id);
    }

    #[test]
    fn test_output_path_swaps_extension() {
        let input = TempDir::new().unwrap();
        let path = with_ctx(input.path(), |ctx| {
            ctx.output_path(Path::new("pages/blog/page.pw"), Path::new("/out"))
        });
        assert_eq!(path, PathBuf::from("/out/pages/blog/page.js"));
    }
}
