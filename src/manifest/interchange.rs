//! Interchange text embedded into the client entry.
//!
//! JSON-shaped, except that [`Value::Raw`] is written verbatim so that
//! executable fragments (`() => import("…")`) land unquoted.
//!
//! ```text
//! [
//!   {
//!     "id": "3f9a1c2e04b7d815-0",
//!     "import": () => import("../components/counter.js")
//!   }
//! ]
//! ```

/// One node of the interchange tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Written as a quoted, escaped string.
    Str(String),
    /// Written as-is.
    Raw(String),
    Array(Vec<Value>),
    /// Keys keep insertion order.
    Object(Vec<(String, Value)>),
}

const INDENT: &str = "  ";

impl Value {
    /// Render with two-space indentation.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, 0);
        out
    }

    fn write(&self, out: &mut String, depth: usize) {
        match self {
            Self::Str(s) => out.push_str(&quote(s)),
            Self::Raw(code) => out.push_str(code),
            Self::Array(items) if items.is_empty() => out.push_str("[]"),
            Self::Object(fields) if fields.is_empty() => out.push_str("{}"),
            Self::Array(items) => {
                out.push_str("[\n");
                for (idx, item) in items.iter().enumerate() {
                    push_indent(out, depth + 1);
                    item.write(out, depth + 1);
                    push_separator(out, idx, items.len());
                }
                push_indent(out, depth);
                out.push(']');
            }
            Self::Object(fields) => {
                out.push_str("{\n");
                for (idx, (key, value)) in fields.iter().enumerate() {
                    push_indent(out, depth + 1);
                    out.push_str(&quote(key));
                    out.push_str(": ");
                    value.write(out, depth + 1);
                    push_separator(out, idx, fields.len());
                }
                push_indent(out, depth);
                out.push('}');
            }
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn push_separator(out: &mut String, idx: usize, len: usize) {
    if idx + 1 < len {
        out.push(',');
    }
    out.push('\n');
}

/// JSON string quoting; a `&str` always serializes.
fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(fields: &[(&str, Value)]) -> Value {
        Value::Object(
            fields
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(Value::Array(vec![]).render(), "[]");
        assert_eq!(Value::Object(vec![]).render(), "{}");
    }

    #[test]
    fn test_raw_is_unquoted_and_strings_are_quoted() {
        let value = Value::Array(vec![obj(&[
            ("name", Value::Str("Counter".into())),
            ("import", Value::Raw("() => import(\"./c.js\")".into())),
        ])]);

        assert_eq!(
            value.render(),
            "[\n  {\n    \"name\": \"Counter\",\n    \"import\": () => import(\"./c.js\")\n  }\n]"
        );
    }

    #[test]
    fn test_strings_are_escaped() {
        let value = Value::Str("a \"quoted\"\nline".into());
        assert_eq!(value.render(), r#""a \"quoted\"\nline""#);
    }

    #[test]
    fn test_order_is_preserved() {
        let value = obj(&[
            ("z", Value::Str("1".into())),
            ("a", Value::Str("2".into())),
        ]);
        let text = value.render();
        assert!(text.find("\"z\"").unwrap() < text.find("\"a\"").unwrap());
    }

    #[test]
    fn test_nested_indentation() {
        let value = obj(&[("list", Value::Array(vec![Value::Raw("1".into())]))]);
        assert_eq!(value.render(), "{\n  \"list\": [\n    1\n  ]\n}");
    }
}
