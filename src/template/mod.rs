//! Template parsing seam.
//!
//! The build pipeline only depends on the [`Parser`] trait: source text in,
//! generated module code plus the ordered list of client component
//! references out. [`MarkupParser`] is the implementation shipped with the
//! CLI.

mod markup;

pub use markup::MarkupParser;

use thiserror::Error;

/// A parse failure, positioned by 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Per-file information handed to the parser.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Input-root-relative path of the template without extension,
    /// e.g. `pages/blog/page`. Seeds reference ids.
    pub module_id: String,
}

/// A client component usage, as reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    /// Unique within one build, stable across builds.
    pub id: String,
    /// Name the component was imported under.
    pub name: String,
    /// Path as declared in the template, relative to the template's directory.
    pub path: String,
}

/// Successful parser output.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub code: String,
    pub components: Vec<ComponentRef>,
}

/// Source text → generated module + ordered component references.
pub trait Parser {
    fn parse(&self, source: &str, ctx: &ParseContext) -> Result<ParseOutput, SyntaxError>;
}
