//! Syntax check for generated JavaScript.

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Parse `source` as an ES module, returning the first syntax error.
pub fn check(source: &str) -> Result<(), String> {
    let allocator = Allocator::default();
    let result = Parser::new(&allocator, source, SourceType::mjs()).parse();

    if let Some(error) = result.errors.first() {
        return Err(format!("syntax error: {error}"));
    }
    if result.panicked {
        return Err("syntax error: parser aborted".to_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_module() {
        assert!(check("").is_ok());
        assert!(check("import page0 from \"./pages/page.js\";\nexport const routes = [{ \"path\": \"/\", \"page\": page0, \"layout\": null }];").is_ok());
        assert!(check("// ( in a comment\nexport const t = `a ${b({ c: `d ${e}` })} }`;").is_ok());
    }

    #[test]
    fn test_unbalanced_brackets() {
        assert!(check("export const a = [\n1,\n").is_err());
        assert!(check("f(\n]").is_err());
        assert!(check("const s = \"abc;\n").is_err());
    }

    #[test]
    fn test_balanced_but_invalid() {
        assert!(check("import page0 from ;\nexport const routes = [ { \"page\": , } ];").is_err());
        assert!(check("export const routes = [ page0 page1 ];").is_err());
        assert!(check("export const = ;").is_err());
        assert!(check("const \"path\": \"/\";").is_err());
    }

    #[test]
    fn test_module_syntax_is_accepted() {
        // `import`/`export` are only legal in module code
        assert!(check("export default function render() { return \"\"; }").is_ok());
    }
}
