//! Route table rendering and emission.

use super::{Route, validate};
use crate::{compiler::PAGES_DIR, error::BuildError, manifest::Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Generated route table, at the output root.
pub const ROUTES_FILE: &str = "routes.js";
/// Fixed server bootstrap, at the output root.
pub const BOOTSTRAP_FILE: &str = "main.js";

const BOOTSTRAP: &str = include_str!("../embed/main.js");

const HEADER: &str = "// Generated by pagewright. Do not edit.\n";

/// Render the route table module.
///
/// Page and layout references get the module extension and a `./` prefix.
pub fn render(routes: &[Route], module_ext: &str) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for (idx, route) in routes.iter().enumerate() {
        out.push_str(&import_line(&format!("page{idx}"), &route.page, module_ext));
        if let Some(layout) = &route.layout {
            out.push_str(&import_line(&format!("layout{idx}"), layout, module_ext));
        }
    }
    if !routes.is_empty() {
        out.push('\n');
    }

    let table = Value::Array(
        routes
            .iter()
            .enumerate()
            .map(|(idx, route)| {
                Value::Object(vec![
                    ("path".into(), Value::Str(route.path.clone())),
                    ("page".into(), Value::Raw(format!("page{idx}"))),
                    (
                        "layout".into(),
                        Value::Raw(match route.layout {
                            Some(_) => format!("layout{idx}"),
                            None => "null".into(),
                        }),
                    ),
                ])
            })
            .collect(),
    );

    let metadata = Value::Object(vec![
        ("root".into(), Value::Str(PAGES_DIR.into())),
        (
            "routes".into(),
            Value::Array(
                routes
                    .iter()
                    .map(|route| {
                        Value::Object(vec![
                            ("path".into(), Value::Str(route.path.clone())),
                            ("page".into(), Value::Str(route.page.clone())),
                            (
                                "layout".into(),
                                route
                                    .layout
                                    .clone()
                                    .map_or_else(|| Value::Raw("null".into()), Value::Str),
                            ),
                        ])
                    })
                    .collect(),
            ),
        ),
    ]);

    out.push_str(&format!("export const routes = {};\n\n", table.render()));
    out.push_str(&format!("export const metadata = {};\n", metadata.render()));
    out
}

fn import_line(binding: &str, reference: &str, module_ext: &str) -> String {
    let specifier = format!("./{reference}.{module_ext}");
    format!(
        "import {binding} from {};\n",
        Value::Str(specifier).render()
    )
}

/// Render, validate and write the route table and the server bootstrap
/// into `output_root`.
///
/// Nothing is written when validation fails.
pub fn emit(routes: &[Route], output_root: &Path, module_ext: &str) -> Result<PathBuf, BuildError> {
    let routes_path = output_root.join(ROUTES_FILE);
    let invalid = |message: String| BuildError::Validation {
        path: routes_path.clone(),
        message,
    };

    for route in routes {
        let references = std::iter::once(&route.page).chain(route.layout.as_ref());
        for reference in references {
            let file = output_root.join(format!("{reference}.{module_ext}"));
            if !file.is_file() {
                return Err(invalid(format!(
                    "route `{}` imports missing `{}`",
                    route.path,
                    file.display()
                )));
            }
        }
    }

    let source = render(routes, module_ext);
    validate::check(&source).map_err(invalid)?;

    fs::create_dir_all(output_root).map_err(|err| BuildError::Io(output_root.to_path_buf(), err))?;
    fs::write(&routes_path, source).map_err(|err| BuildError::Io(routes_path.clone(), err))?;

    let bootstrap = output_root.join(BOOTSTRAP_FILE);
    fs::write(&bootstrap, BOOTSTRAP).map_err(|err| BuildError::Io(bootstrap, err))?;

    Ok(routes_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn route(path: &str, page: &str, layout: Option<&str>) -> Route {
        Route {
            path: path.into(),
            page: page.into(),
            layout: layout.map(Into::into),
        }
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_render_imports_and_tables() {
        let routes = [
            route("/", "pages/page", None),
            route("/blog", "pages/blog/page", Some("pages/blog/layout")),
        ];
        let source = render(&routes, "js");

        assert!(source.contains("import page0 from \"./pages/page.js\";"));
        assert!(source.contains("import page1 from \"./pages/blog/page.js\";"));
        assert!(source.contains("import layout1 from \"./pages/blog/layout.js\";"));
        assert!(!source.contains("layout0 from"));

        assert!(source.contains("\"page\": page1,\n    \"layout\": layout1"));
        assert!(source.contains("\"page\": page0,\n    \"layout\": null"));
        assert!(source.contains("\"root\": \"pages\""));
        assert!(source.contains("\"layout\": \"pages/blog/layout\""));
        assert!(validate::check(&source).is_ok());
    }

    #[test]
    fn test_render_empty() {
        let source = render(&[], "js");
        assert!(source.contains("export const routes = [];"));
        assert!(source.contains("\"routes\": []"));
        assert!(validate::check(&source).is_ok());
    }

    #[test]
    fn test_emit_writes_routes_and_bootstrap() {
        let out = TempDir::new().unwrap();
        touch(out.path(), "pages/page.js");

        let written = emit(&[route("/", "pages/page", None)], out.path(), "js").unwrap();

        assert_eq!(written, out.path().join(ROUTES_FILE));
        assert!(fs::read_to_string(&written).unwrap().contains("./pages/page.js"));
        let bootstrap = fs::read_to_string(out.path().join(BOOTSTRAP_FILE)).unwrap();
        assert!(bootstrap.contains("./routes.js"));
    }

    #[test]
    fn test_emit_rejects_missing_page() {
        let out = TempDir::new().unwrap();
        touch(out.path(), "pages/page.js");

        let err = emit(
            &[
                route("/", "pages/page", None),
                route("/gone", "pages/gone/page", None),
            ],
            out.path(),
            "js",
        )
        .unwrap_err();

        assert!(matches!(err, BuildError::Validation { .. }));
        assert!(err.to_string().contains("/gone"));
        assert!(!out.path().join(ROUTES_FILE).exists());
        assert!(!out.path().join(BOOTSTRAP_FILE).exists());
    }
}
