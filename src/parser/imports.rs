use std::sync::OnceLock;

use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator, Tree};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// The kind of import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// ESM static import: `import { X } from './module'`
    Esm,
    /// CommonJS require: `const X = require('./module')`
    Cjs,
}

/// One name bound by an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// The name used in the importing file.
    pub local: String,
    /// The name on the exporting side: the original identifier, `"default"`,
    /// or `"*"` for namespace/whole-module bindings.
    pub imported: String,
}

/// An import declaration extracted from a source file.
///
/// Consumed only to build graph edges; the binding list is carried so
/// node metadata can show what each file pulls in.
#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub kind: ImportKind,
    /// The raw module specifier string, e.g. `"react"` or `"./utils"`.
    pub specifier: String,
    pub bindings: Vec<ImportBinding>,
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// Tree-sitter query for ESM static imports.
const IMPORT_QUERY: &str = r#"
    (import_statement
      source: (string (string_fragment) @module_path)) @import
"#;

/// Tree-sitter query for CJS require calls.
/// No #eq? predicate — tree-sitter 0.26 StreamingIterator does not auto-filter
/// custom predicates, so the "require" check happens in code.
const REQUIRE_QUERY: &str = r#"
    (call_expression
      function: (identifier) @fn
      arguments: (arguments (string (string_fragment) @module_path))) @call
"#;

// ---------------------------------------------------------------------------
// Query cache (compiled once per grammar via OnceLock)
// ---------------------------------------------------------------------------

static TS_QUERIES: OnceLock<(Query, Query)> = OnceLock::new();
static TSX_QUERIES: OnceLock<(Query, Query)> = OnceLock::new();
static JS_QUERIES: OnceLock<(Query, Query)> = OnceLock::new();

fn queries_for(language: &Language, grammar_ext: &str) -> &'static (Query, Query) {
    let cell = match grammar_ext {
        "ts" => &TS_QUERIES,
        "tsx" => &TSX_QUERIES,
        _ => &JS_QUERIES,
    };
    cell.get_or_init(|| {
        (
            Query::new(language, IMPORT_QUERY).expect("invalid import query"),
            Query::new(language, REQUIRE_QUERY).expect("invalid require query"),
        )
    })
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Extract all import declarations from a parsed file.
///
/// `grammar_ext` must name the grammar that produced `tree` ("ts", "tsx", "js").
pub fn extract_imports(
    tree: &Tree,
    source: &[u8],
    language: &Language,
    grammar_ext: &str,
) -> Vec<ImportInfo> {
    let (import_query, require_query) = queries_for(language, grammar_ext);
    let mut imports = Vec::new();

    let import_idx = import_query
        .capture_index_for_name("import")
        .expect("query must have @import capture");
    let path_idx = import_query
        .capture_index_for_name("module_path")
        .expect("query must have @module_path capture");

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(import_query, tree.root_node(), source);
    while let Some(m) = matches.next() {
        let mut import_node: Option<Node> = None;
        let mut specifier = String::new();
        for capture in m.captures {
            if capture.index == import_idx {
                import_node = Some(capture.node);
            } else if capture.index == path_idx {
                specifier = node_text(capture.node, source).to_owned();
            }
        }
        let Some(import_node) = import_node else {
            continue;
        };
        imports.push(ImportInfo {
            kind: ImportKind::Esm,
            specifier,
            bindings: extract_esm_bindings(import_node, source),
        });
    }

    let fn_idx = require_query
        .capture_index_for_name("fn")
        .expect("query must have @fn capture");
    let call_idx = require_query
        .capture_index_for_name("call")
        .expect("query must have @call capture");
    let req_path_idx = require_query
        .capture_index_for_name("module_path")
        .expect("query must have @module_path capture");

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(require_query, tree.root_node(), source);
    while let Some(m) = matches.next() {
        let mut call_node: Option<Node> = None;
        let mut is_require = false;
        let mut specifier = String::new();
        for capture in m.captures {
            if capture.index == fn_idx {
                is_require = node_text(capture.node, source) == "require";
            } else if capture.index == call_idx {
                call_node = Some(capture.node);
            } else if capture.index == req_path_idx {
                specifier = node_text(capture.node, source).to_owned();
            }
        }
        if !is_require {
            continue;
        }
        let bindings = call_node
            .map(|c| extract_require_bindings(c, source))
            .unwrap_or_default();
        imports.push(ImportInfo {
            kind: ImportKind::Cjs,
            specifier,
            bindings,
        });
    }

    imports
}

/// Collect `(local, imported)` pairs from an `import_statement` node.
///
/// Handles:
/// - Named: `import { useState, useEffect as UE } from 'react'`
/// - Default: `import React from 'react'`
/// - Namespace: `import * as path from 'path'`
/// - Combined: `import React, { useState } from 'react'`
/// - Side-effect: `import './setup'` (no bindings)
fn extract_esm_bindings(import_node: Node, source: &[u8]) -> Vec<ImportBinding> {
    let mut bindings = Vec::new();
    let mut cursor = import_node.walk();
    for child in import_node.children(&mut cursor) {
        if child.kind() == "import_clause" {
            extract_import_clause(child, source, &mut bindings);
        }
    }
    bindings
}

fn extract_import_clause(clause: Node, source: &[u8], bindings: &mut Vec<ImportBinding>) {
    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "identifier" => bindings.push(ImportBinding {
                local: node_text(child, source).to_owned(),
                imported: "default".to_owned(),
            }),
            "named_imports" => extract_named_imports(child, source, bindings),
            "namespace_import" => {
                // `* as ns` — the identifier has no field name, find it by kind.
                let mut ns_cursor = child.walk();
                for ns_child in child.children(&mut ns_cursor) {
                    if ns_child.kind() == "identifier" {
                        bindings.push(ImportBinding {
                            local: node_text(ns_child, source).to_owned(),
                            imported: "*".to_owned(),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

fn extract_named_imports(named: Node, source: &[u8], bindings: &mut Vec<ImportBinding>) {
    let mut cursor = named.walk();
    for child in named.children(&mut cursor) {
        if child.kind() != "import_specifier" {
            continue;
        }
        // In `import { foo as bar }`: field name -> "foo", field alias -> "bar".
        let name_node = child.child_by_field_name("name");
        let alias_node = child.child_by_field_name("alias");
        match (name_node, alias_node) {
            (Some(n), Some(a)) => bindings.push(ImportBinding {
                local: node_text(a, source).to_owned(),
                imported: node_text(n, source).to_owned(),
            }),
            (Some(n), None) => {
                let name = node_text(n, source).to_owned();
                bindings.push(ImportBinding {
                    local: name.clone(),
                    imported: name,
                });
            }
            _ => {}
        }
    }
}

/// Collect bindings for `const X = require('./m')` / `const { a, b } = require('./m')`.
///
/// Bare `require('./m')` calls (side effects, nested expressions) yield no bindings.
fn extract_require_bindings(call: Node, source: &[u8]) -> Vec<ImportBinding> {
    let mut bindings = Vec::new();
    let Some(parent) = call.parent() else {
        return bindings;
    };
    if parent.kind() != "variable_declarator" {
        return bindings;
    }
    let Some(name_node) = parent.child_by_field_name("name") else {
        return bindings;
    };
    match name_node.kind() {
        "identifier" => bindings.push(ImportBinding {
            local: node_text(name_node, source).to_owned(),
            imported: "*".to_owned(),
        }),
        "object_pattern" => {
            let mut cursor = name_node.walk();
            for prop in name_node.named_children(&mut cursor) {
                match prop.kind() {
                    "shorthand_property_identifier_pattern" => {
                        let name = node_text(prop, source).to_owned();
                        bindings.push(ImportBinding {
                            local: name.clone(),
                            imported: name,
                        });
                    }
                    "pair_pattern" => {
                        if let (Some(key), Some(value)) = (
                            prop.child_by_field_name("key"),
                            prop.child_by_field_name("value"),
                        ) {
                            bindings.push(ImportBinding {
                                local: node_text(value, source).to_owned(),
                                imported: node_text(key, source).to_owned(),
                            });
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
    bindings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{language_for_extension, parse_source};

    fn imports_of(ext: &str, src: &str) -> Vec<ImportInfo> {
        let parsed = parse_source(ext, src.as_bytes()).expect("fixture should parse");
        let lang = language_for_extension(parsed.grammar_ext).unwrap();
        extract_imports(&parsed.tree, src.as_bytes(), &lang, parsed.grammar_ext)
    }

    fn pairs(info: &ImportInfo) -> Vec<(&str, &str)> {
        info.bindings
            .iter()
            .map(|b| (b.local.as_str(), b.imported.as_str()))
            .collect()
    }

    #[test]
    fn test_named_imports() {
        let imports = imports_of("js", "import { useState, useEffect } from 'react';");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].kind, ImportKind::Esm);
        assert_eq!(imports[0].specifier, "react");
        assert_eq!(
            pairs(&imports[0]),
            vec![("useState", "useState"), ("useEffect", "useEffect")]
        );
    }

    #[test]
    fn test_default_and_aliased_imports() {
        let imports = imports_of("js", "import React, { useMemo as memo } from 'react';");
        assert_eq!(
            pairs(&imports[0]),
            vec![("React", "default"), ("memo", "useMemo")]
        );
    }

    #[test]
    fn test_namespace_import() {
        let imports = imports_of("ts", "import * as api from './api';");
        assert_eq!(imports[0].specifier, "./api");
        assert_eq!(pairs(&imports[0]), vec![("api", "*")]);
    }

    #[test]
    fn test_side_effect_import() {
        let imports = imports_of("js", "import './polyfills';");
        assert_eq!(imports[0].specifier, "./polyfills");
        assert!(imports[0].bindings.is_empty());
    }

    #[test]
    fn test_cjs_require() {
        let imports = imports_of("js", "const express = require('express');");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].kind, ImportKind::Cjs);
        assert_eq!(imports[0].specifier, "express");
        assert_eq!(pairs(&imports[0]), vec![("express", "*")]);
    }

    #[test]
    fn test_cjs_destructured_require() {
        let imports = imports_of("js", "const { Router, json: parseJson } = require('express');");
        assert_eq!(
            pairs(&imports[0]),
            vec![("Router", "Router"), ("parseJson", "json")]
        );
    }

    #[test]
    fn test_non_require_call_is_not_an_import() {
        let imports = imports_of("js", "const x = fetchData('./api');");
        assert!(imports.is_empty());
    }
}
