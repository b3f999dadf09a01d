//! Built-in template language.
//!
//! ```text
//! ---
//! import Card from "../components/card.pw"
//! import Counter from "../components/counter.pw"
//! ---
//! <h1>{props.title}</h1>
//! <Card title="Hello" />
//! <Counter client start={3} />
//! ```
//!
//! - `{expr}` is HTML-escaped at render time; `{@html expr}` is not.
//! - `<Name ... />` renders an imported template on the server.
//! - `<Name client ... />` leaves an island placeholder and reports a
//!   [`ComponentRef`] for the client bundle.

use super::{ComponentRef, ParseContext, ParseOutput, Parser, SyntaxError};
use regex::Regex;
use std::{collections::HashSet, fmt::Write, sync::OnceLock};

/// Header fence line.
const FENCE: &str = "---";

/// Prefix of an unescaped interpolation.
const RAW_PREFIX: &str = "@html";

/// Bare attribute marking a client-side usage.
const CLIENT_ATTR: &str = "client";

/// Runtime escape helper prepended to every generated module.
const ESCAPE_HELPER: &str = "const __esc = (value) => String(value ?? \"\").replace(/[&<>\"']/g, (c) => `&#${c.charCodeAt(0)};`);\n";

fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^import[ \t]+([A-Z][A-Za-z0-9_]*)[ \t]+from[ \t]+"([^"]+)"[ \t]*;?$"#).unwrap()
    })
}

/// Parser for `.pw` templates, emitting ES modules.
#[derive(Debug, Clone)]
pub struct MarkupParser {
    template_ext: String,
    module_ext: String,
}

impl MarkupParser {
    pub fn new(template_ext: impl Into<String>, module_ext: impl Into<String>) -> Self {
        Self {
            template_ext: template_ext.into(),
            module_ext: module_ext.into(),
        }
    }

    /// Point a template import at its transpiled module.
    fn module_specifier(&self, path: &str) -> String {
        match path.strip_suffix(&format!(".{}", self.template_ext)) {
            Some(stem) => format!("{stem}.{}", self.module_ext),
            None => path.to_owned(),
        }
    }
}

impl Parser for MarkupParser {
    fn parse(&self, source: &str, ctx: &ParseContext) -> Result<ParseOutput, SyntaxError> {
        let (imports, body, body_line) = split_header(source)?;
        let segments = Scanner::new(body, body_line).scan(&imports)?;
        Ok(self.generate(&imports, &segments, ctx))
    }
}

// ============================================================================
// Header
// ============================================================================

#[derive(Debug)]
struct Import {
    name: String,
    path: String,
}

/// Split off the `---` header. Returns the imports, the body and the
/// 1-based line number the body starts on.
fn split_header(source: &str) -> Result<(Vec<Import>, &str, usize), SyntaxError> {
    let mut lines = source.split_inclusive('\n').enumerate();
    let mut offset = 0;

    // Only blank lines may precede the opening fence.
    let opening = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => offset += line.len(),
            Some((idx, line)) if line.trim() == FENCE => {
                offset += line.len();
                break idx + 1;
            }
            _ => return Ok((Vec::new(), source, 1)),
        }
    };

    let mut imports: Vec<Import> = Vec::new();
    let mut seen = HashSet::new();

    for (idx, line) in lines {
        let line_no = idx + 1;
        let trimmed = line.trim();
        offset += line.len();

        if trimmed == FENCE {
            return Ok((imports, &source[offset..], line_no + 1));
        }
        if trimmed.is_empty() {
            continue;
        }

        let caps = import_regex()
            .captures(trimmed)
            .ok_or_else(|| SyntaxError::new(line_no, format!("malformed import `{trimmed}`")))?;
        let name = caps[1].to_owned();
        if !seen.insert(name.clone()) {
            return Err(SyntaxError::new(line_no, format!("duplicate import `{name}`")));
        }
        imports.push(Import {
            name,
            path: caps[2].to_owned(),
        });
    }

    Err(SyntaxError::new(opening, "unterminated header"))
}

// ============================================================================
// Body
// ============================================================================

#[derive(Debug)]
enum AttrValue {
    Text(String),
    Expr(String),
    Flag,
}

#[derive(Debug)]
struct Attr {
    name: String,
    value: AttrValue,
}

#[derive(Debug)]
enum Segment {
    Text(String),
    Expr(String),
    Raw(String),
    Component {
        name: String,
        attrs: Vec<Attr>,
        client: bool,
    },
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    first_line: usize,
}

impl<'a> Scanner<'a> {
    const fn new(src: &'a str, first_line: usize) -> Self {
        Self {
            src,
            pos: 0,
            first_line,
        }
    }

    fn line_at(&self, offset: usize) -> usize {
        self.first_line + self.src[..offset].matches('\n').count()
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.line_at(offset), message)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn scan(mut self, imports: &[Import]) -> Result<Vec<Segment>, SyntaxError> {
        let mut segments = Vec::new();
        let mut text = String::new();

        while let Some(ch) = self.rest().chars().next() {
            if ch == '{' {
                flush_text(&mut text, &mut segments);
                let start = self.pos;
                let expr = self.braced()?;
                let expr = expr.trim();
                let segment = match expr.strip_prefix(RAW_PREFIX) {
                    Some(raw) if raw.starts_with(char::is_whitespace) => {
                        Segment::Raw(raw.trim().to_owned())
                    }
                    _ => Segment::Expr(expr.to_owned()),
                };
                if matches!(&segment, Segment::Expr(e) | Segment::Raw(e) if e.is_empty()) {
                    return Err(self.error(start, "empty expression"));
                }
                segments.push(segment);
            } else if ch == '<' && self.rest()[1..].starts_with(|c: char| c.is_ascii_uppercase()) {
                flush_text(&mut text, &mut segments);
                segments.push(self.component(imports)?);
            } else {
                text.push(ch);
                self.pos += ch.len_utf8();
            }
        }

        flush_text(&mut text, &mut segments);
        Ok(segments)
    }

    /// Consume `{ ... }` at the cursor and return the inner text.
    fn braced(&mut self) -> Result<&'a str, SyntaxError> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for (idx, ch) in self.rest().char_indices() {
            if let Some(q) = quote {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    _ if ch == q => quote = None,
                    _ => {}
                }
                continue;
            }
            match ch {
                '"' | '\'' | '`' => quote = Some(ch),
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = &self.src[start + 1..start + idx];
                        self.pos = start + idx + 1;
                        return Ok(inner);
                    }
                }
                _ => {}
            }
        }

        Err(self.error(start, "unterminated `{`"))
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn ident(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// Consume `<Name attr... />`.
    fn component(&mut self, imports: &[Import]) -> Result<Segment, SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        let name = self.ident().to_owned();

        if !imports.iter().any(|i| i.name == name) {
            return Err(self.error(start, format!("unknown component `{name}`")));
        }

        let mut attrs = Vec::new();
        let mut client = false;

        loop {
            self.skip_whitespace();
            let rest = self.rest();

            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(Segment::Component {
                    name,
                    attrs,
                    client,
                });
            }
            if rest.starts_with('>') {
                return Err(self.error(
                    start,
                    format!("component `{name}` must be self-closing"),
                ));
            }
            if rest.is_empty() {
                return Err(self.error(start, format!("unterminated tag `{name}`")));
            }
            if !rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
                return Err(self.error(self.pos, format!("malformed attribute in `{name}`")));
            }

            let attr_name = self.ident().to_owned();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.attr_value(&name)?
            } else {
                AttrValue::Flag
            };

            if attr_name == CLIENT_ATTR && matches!(value, AttrValue::Flag) {
                client = true;
            } else {
                attrs.push(Attr {
                    name: attr_name,
                    value,
                });
            }
        }
    }

    fn attr_value(&mut self, tag: &str) -> Result<AttrValue, SyntaxError> {
        let rest = self.rest();
        if rest.starts_with('{') {
            return Ok(AttrValue::Expr(self.braced()?.trim().to_owned()));
        }
        if let Some(body) = rest.strip_prefix('"') {
            let Some(end) = body.find('"') else {
                return Err(self.error(self.pos, format!("unterminated attribute in `{tag}`")));
            };
            self.pos += end + 2;
            return Ok(AttrValue::Text(body[..end].to_owned()));
        }
        Err(self.error(self.pos, format!("malformed attribute in `{tag}`")))
    }
}

fn flush_text(text: &mut String, segments: &mut Vec<Segment>) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

// ============================================================================
// Code Generation
// ============================================================================

impl MarkupParser {
    fn generate(&self, imports: &[Import], segments: &[Segment], ctx: &ParseContext) -> ParseOutput {
        let server_used: HashSet<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Component {
                    name,
                    client: false,
                    ..
                } => Some(name.as_str()),
                _ => None,
            })
            .collect();

        let mut code = String::new();
        for import in imports.iter().filter(|i| server_used.contains(i.name.as_str())) {
            let specifier = self.module_specifier(&import.path);
            let _ = writeln!(code, "import {} from {};", import.name, quote(&specifier));
        }
        if !code.is_empty() {
            code.push('\n');
        }
        code.push_str(ESCAPE_HELPER);
        code.push_str("\nexport default function render(props = {}) {\n  return `");

        let id_prefix = id_prefix(&ctx.module_id);
        let mut components = Vec::new();

        for segment in segments {
            match segment {
                Segment::Text(text) => code.push_str(&escape_template(text)),
                Segment::Expr(expr) => {
                    let _ = write!(code, "${{__esc({expr})}}");
                }
                Segment::Raw(expr) => {
                    let _ = write!(code, "${{({expr}) ?? \"\"}}");
                }
                Segment::Component {
                    name,
                    attrs,
                    client: false,
                } => {
                    let _ = write!(code, "${{{name}({})}}", props_object(attrs));
                }
                Segment::Component {
                    name,
                    attrs,
                    client: true,
                } => {
                    let id = format!("{id_prefix}-{}", components.len());
                    let _ = write!(
                        code,
                        "<div data-island=\"{id}\" data-component=\"{name}\" data-props=\"${{__esc(JSON.stringify({}))}}\"></div>",
                        props_object(attrs)
                    );
                    // Only imported names get this far.
                    let path = imports
                        .iter()
                        .find(|i| &i.name == name)
                        .map(|i| i.path.clone())
                        .unwrap_or_default();
                    components.push(ComponentRef {
                        id,
                        name: name.clone(),
                        path,
                    });
                }
            }
        }

        code.push_str("`;\n}\n");
        ParseOutput { code, components }
    }
}

/// First 16 hex chars (64 bits) of the module id's hash.
fn id_prefix(module_id: &str) -> String {
    let hash = blake3::hash(module_id.as_bytes());
    hex::encode(&hash.as_bytes()[..8])
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

fn props_object(attrs: &[Attr]) -> String {
    if attrs.is_empty() {
        return "{}".to_owned();
    }
    let fields: Vec<String> = attrs
        .iter()
        .map(|attr| {
            let value = match &attr.value {
                AttrValue::Text(text) => quote(text),
                AttrValue::Expr(expr) => format!("({expr})"),
                AttrValue::Flag => "true".to_owned(),
            };
            format!("{}: {value}", quote(&attr.name))
        })
        .collect();
    format!("{{ {} }}", fields.join(", "))
}

/// Escape literal text for a JS template literal.
fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<ParseOutput, SyntaxError> {
        let ctx = ParseContext {
            module_id: "pages/page".into(),
        };
        MarkupParser::new("pw", "js").parse(source, &ctx)
    }

    #[test]
    fn test_plain_markup() {
        let out = parse("<h1>Hello</h1>\n").unwrap();
        assert!(out.code.contains("export default function render(props = {})"));
        assert!(out.code.contains("return `<h1>Hello</h1>\n`;"));
        assert!(out.components.is_empty());
    }

    #[test]
    fn test_interpolation_is_escaped() {
        let out = parse("<p>{props.name}</p>").unwrap();
        assert!(out.code.contains("<p>${__esc(props.name)}</p>"));
    }

    #[test]
    fn test_raw_interpolation() {
        let out = parse("<main>{@html props.children}</main>").unwrap();
        assert!(out.code.contains("<main>${(props.children) ?? \"\"}</main>"));

        // Not a raw marker without a following expression
        let out = parse("{@htmlish}").unwrap();
        assert!(out.code.contains("${__esc(@htmlish)}"));
    }

    #[test]
    fn test_literal_text_is_template_safe() {
        let out = parse("cost: $5 `code` \\ ${nope").unwrap_err();
        // `${nope` opens an unterminated expression
        assert_eq!(out.message, "unterminated `{`");

        let out = parse("cost: $5 `code` \\").unwrap();
        assert!(out.code.contains("cost: $5 \\`code\\` \\\\"));
    }

    #[test]
    fn test_server_component_import_rewritten() {
        let src = "---\nimport Card from \"./card.pw\"\n---\n<Card title=\"Hi\" n={1 + 1} />";
        let out = parse(src).unwrap();
        assert!(out.code.starts_with("import Card from \"./card.js\";\n"));
        assert!(out.code.contains("${Card({ \"title\": \"Hi\", \"n\": (1 + 1) })}"));
        assert!(out.components.is_empty());
    }

    #[test]
    fn test_client_component_reported_in_order() {
        let src = "---\nimport A from \"../c/a.pw\"\nimport B from \"../c/b.pw\"\n---\n<B client />\n<A client x={1} />\n<B client />";
        let out = parse(src).unwrap();

        let names: Vec<_> = out.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "B"]);
        assert_eq!(out.components[1].path, "../c/a.pw");

        // Client-only components are not imported server-side
        assert!(!out.code.contains("import A"));

        let ids: HashSet<_> = out.components.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert!(out.code.contains(&format!("data-island=\"{}\"", out.components[0].id)));
    }

    #[test]
    fn test_ids_are_stable_per_module() {
        let src = "---\nimport A from \"./a.pw\"\n---\n<A client />";
        let first = parse(src).unwrap();
        let second = parse(src).unwrap();
        assert_eq!(first.components[0].id, second.components[0].id);

        let other = MarkupParser::new("pw", "js")
            .parse(src, &ParseContext { module_id: "pages/about/page".into() })
            .unwrap();
        assert_ne!(first.components[0].id, other.components[0].id);
    }

    #[test]
    fn test_header_spacing() {
        let src = "---\nimport\tCard  from \"./card.pw\";\n\nimport Counter from \"./counter.pw\"\n---\n<Card />";
        let out = parse(src).unwrap();
        assert!(out.code.contains("import Card from \"./card.js\";"));
        assert!(!out.code.contains("import Counter"));
    }

    #[test]
    fn test_id_prefix_is_64_bits() {
        let out = parse("---\nimport A from \"./a.pw\"\n---\n<A client />").unwrap();
        let (prefix, index) = out.components[0].id.split_once('-').unwrap();
        assert_eq!(prefix.len(), 16);
        assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(index, "0");
    }

    #[test]
    fn test_unknown_component() {
        let err = parse("<p>\n<Missing /></p>").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unknown component `Missing`"));
    }

    #[test]
    fn test_component_must_self_close() {
        let err = parse("---\nimport A from \"./a.pw\"\n---\n<A></A>").unwrap_err();
        assert_eq!(err.line, 4);
        assert!(err.message.contains("self-closing"));
    }

    #[test]
    fn test_unterminated_header() {
        let err = parse("---\nimport A from \"./a.pw\"\n").unwrap_err();
        assert_eq!(err, SyntaxError::new(1, "unterminated header"));
    }

    #[test]
    fn test_malformed_and_duplicate_imports() {
        let err = parse("---\nimport a from './a.pw'\n---\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.starts_with("malformed import"));

        let err = parse("---\nimport A from \"./a.pw\"\nimport A from \"./b.pw\"\n---\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("duplicate import `A`"));
    }

    #[test]
    fn test_unterminated_expression_reports_line() {
        let err = parse("a\nb {props.x\nc").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_braces_inside_strings() {
        let out = parse("{\"}\" + props.x}").unwrap();
        assert!(out.code.contains("${__esc(\"}\" + props.x)}"));
    }

    #[test]
    fn test_body_lines_after_header() {
        let err = parse("\n---\nimport A from \"./a.pw\"\n---\nok\n{").unwrap_err();
        assert_eq!(err.line, 6);
    }
}
