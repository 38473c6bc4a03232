pub mod imports;
pub mod symbols;

use std::cell::RefCell;

use anyhow::{Result, anyhow};
use tree_sitter::{Language, Parser, Tree};

/// The grammar used for a given source extension, or `None` when the
/// extension is unsupported.
///
/// `.ts` and `.tsx` deliberately map to different grammars: plain TypeScript
/// rejects JSX, and TSX cannot parse angle-bracket type assertions
/// (`<T>expr`), so neither can stand in for the other.
pub fn language_for_extension(ext: &str) -> Option<Language> {
    match ext {
        "ts" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "tsx" => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "js" | "jsx" => Some(tree_sitter_javascript::LANGUAGE.into()),
        _ => None,
    }
}

// Thread-local Parser instances — one per rayon worker thread, zero lock contention.
// Each Parser is initialised once per thread with the appropriate grammar.
thread_local! {
    static PARSER_TS: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        p.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()).unwrap();
        p
    });
    static PARSER_TSX: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        p.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into()).unwrap();
        p
    });
    static PARSER_JS: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        p.set_language(&tree_sitter_javascript::LANGUAGE.into()).unwrap();
        p
    });
}

/// A successfully parsed source file.
///
/// `grammar_ext` names the grammar that produced the tree ("ts", "tsx", "js").
/// When the first-tier parse fails the retry grammar differs from the file's
/// extension, and downstream query selection must follow the tree, not the file.
pub struct ParsedSource {
    pub tree: Tree,
    pub grammar_ext: &'static str,
}

/// Canonicalise an extension to the grammar key used for parser selection.
fn grammar_key(ext: &str) -> Option<&'static str> {
    match ext {
        "ts" => Some("ts"),
        "tsx" => Some("tsx"),
        "js" | "jsx" => Some("js"),
        _ => None,
    }
}

/// The retry grammar for a failed first-tier parse.
///
/// TSX is the most permissive grammar (types + JSX), so everything retries as
/// TSX — except TSX itself, which retries as plain JavaScript.
fn fallback_key(key: &str) -> &'static str {
    match key {
        "tsx" => "js",
        _ => "tsx",
    }
}

fn parse_with(key: &str, source: &[u8]) -> Option<Tree> {
    match key {
        "ts" => PARSER_TS.with(|p| p.borrow_mut().parse(source, None)),
        "tsx" => PARSER_TSX.with(|p| p.borrow_mut().parse(source, None)),
        "js" => PARSER_JS.with(|p| p.borrow_mut().parse(source, None)),
        _ => None,
    }
}

/// True when tree-sitter produced a usable tree: present and free of syntax errors.
fn is_clean(tree: &Option<Tree>) -> bool {
    tree.as_ref().is_some_and(|t| !t.root_node().has_error())
}

/// Parse a source file with the two-tier strategy.
///
/// Tier one uses the extension-derived grammar; tier two retries with the
/// permissive fallback grammar (see [`fallback_key`]). A tree containing
/// syntax errors counts as a failed tier. When both tiers fail the error is
/// confined to this file — callers degrade to an empty symbol set and, for
/// route inference, the text-pattern fallback.
///
/// # Errors
/// - unsupported file extension (not `.ts`/`.tsx`/`.js`/`.jsx`)
/// - both parse tiers produced a broken tree
pub fn parse_source(ext: &str, source: &[u8]) -> Result<ParsedSource> {
    let primary = grammar_key(ext).ok_or_else(|| anyhow!("unsupported file extension: {ext:?}"))?;

    let tree = parse_with(primary, source);
    if is_clean(&tree) {
        return Ok(ParsedSource {
            tree: tree.unwrap(),
            grammar_ext: primary,
        });
    }

    let retry = fallback_key(primary);
    let tree = parse_with(retry, source);
    if is_clean(&tree) {
        return Ok(ParsedSource {
            tree: tree.unwrap(),
            grammar_ext: retry,
        });
    }

    Err(anyhow!(
        "syntax errors with both {primary:?} and {retry:?} grammars"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_js() {
        let parsed = parse_source("js", b"const x = 1;").expect("js should parse");
        assert_eq!(parsed.grammar_ext, "js");
    }

    #[test]
    fn test_ts_with_jsx_retries_as_tsx() {
        // The TypeScript grammar rejects JSX; the fallback tier must pick it up.
        let src = b"export const App = () => <div>hi</div>;";
        let parsed = parse_source("ts", src).expect("tsx retry should succeed");
        assert_eq!(parsed.grammar_ext, "tsx");
    }

    #[test]
    fn test_garbage_fails_both_tiers() {
        let src = b"function ((( {{{ oops";
        assert!(parse_source("js", src).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(parse_source("py", b"x = 1").is_err());
    }

    #[test]
    fn test_language_mapping_covers_source_extensions() {
        for ext in ["ts", "tsx", "js", "jsx"] {
            assert!(language_for_extension(ext).is_some(), "{ext} must map");
        }
        assert!(language_for_extension("css").is_none());
    }
}
