use std::collections::HashSet;

use tree_sitter::{Node, Tree};

use crate::graph::node::{
    DetectionRule, RouteProps, SymbolInfo, SymbolKind, UsageFact, snippet_of,
};

/// Maximum characters retained in a symbol's code preview.
const SYMBOL_PREVIEW_CHARS: usize = 800;

/// Everything one classification pass learns about a file.
#[derive(Debug, Default, Clone)]
pub struct FileFacts {
    pub components: Vec<SymbolInfo>,
    pub hooks: Vec<SymbolInfo>,
    pub contexts: Vec<SymbolInfo>,
    pub uses: Vec<UsageFact>,
    pub providers: Vec<String>,
    pub routes: Vec<RouteProps>,
}

/// Classify every declaration in `tree` and record usage facts, in a single
/// traversal.
///
/// Ordered heuristics per declaration:
/// - Component: capitalized name AND the body produces at least one JSX element.
/// - Hook: name matches `use` + uppercase letter or digit, independent of the
///   Component test. A declaration matching both is logged as ambiguous and
///   recorded in both buckets.
/// - Context: an identifier bound to the result of a `createContext(...)` call,
///   bare or qualified.
///
/// Symbols are unique by name within the file; the first declaration wins.
/// `rel_path` is only used in warning messages.
pub fn classify(tree: &Tree, source: &str, rel_path: &str) -> FileFacts {
    let mut facts = FileFacts::default();
    let mut seen = SeenNames::default();
    visit(tree.root_node(), source, rel_path, &mut facts, &mut seen);
    facts
}

/// Per-kind name registry enforcing the unique-by-name-in-file invariant.
#[derive(Default)]
struct SeenNames {
    components: HashSet<String>,
    hooks: HashSet<String>,
    contexts: HashSet<String>,
}

fn visit(node: Node, source: &str, rel_path: &str, facts: &mut FileFacts, seen: &mut SeenNames) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_text(name_node, source);
                let has_jsx = node
                    .child_by_field_name("body")
                    .map(contains_jsx)
                    .unwrap_or(false);
                record_declaration(
                    name,
                    node,
                    has_jsx,
                    DetectionRule::FunctionJsx,
                    source,
                    rel_path,
                    facts,
                    seen,
                );
            }
        }
        "class_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_text(name_node, source);
                if starts_uppercase(name) && contains_jsx(node) {
                    push_symbol(
                        facts,
                        seen,
                        SymbolKind::Component,
                        symbol_info(name, SymbolKind::Component, DetectionRule::ClassJsx, node, source),
                    );
                }
            }
        }
        "variable_declarator" => {
            if let (Some(name_node), Some(value)) = (
                node.child_by_field_name("name"),
                node.child_by_field_name("value"),
            ) && name_node.kind() == "identifier"
            {
                let name = node_text(name_node, source);
                match value.kind() {
                    "arrow_function" | "function" | "function_expression" => {
                        let has_jsx = value
                            .child_by_field_name("body")
                            .map(contains_jsx)
                            .unwrap_or(false);
                        record_declaration(
                            name,
                            node,
                            has_jsx,
                            DetectionRule::ArrowJsx,
                            source,
                            rel_path,
                            facts,
                            seen,
                        );
                    }
                    "call_expression" => {
                        if is_create_context_call(value, source) {
                            push_symbol(
                                facts,
                                seen,
                                SymbolKind::Context,
                                symbol_info(
                                    name,
                                    SymbolKind::Context,
                                    DetectionRule::ContextCall,
                                    node,
                                    source,
                                ),
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
        "jsx_opening_element" | "jsx_self_closing_element" => {
            record_element_facts(node, source, facts);
        }
        "call_expression" => {
            record_call_facts(node, source, facts);
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, source, rel_path, facts, seen);
    }
}

// ---------------------------------------------------------------------------
// Declaration handling
// ---------------------------------------------------------------------------

/// Apply the Component and Hook rules to a function-shaped declaration.
#[allow(clippy::too_many_arguments)]
fn record_declaration(
    name: &str,
    decl_node: Node,
    body_has_jsx: bool,
    component_rule: DetectionRule,
    source: &str,
    rel_path: &str,
    facts: &mut FileFacts,
    seen: &mut SeenNames,
) {
    let is_component = starts_uppercase(name) && body_has_jsx;
    let is_hook = is_hook_name(name);

    if is_component && is_hook {
        eprintln!("warning: {rel_path}: {name:?} matches both the component and hook rules");
    }
    if is_component {
        push_symbol(
            facts,
            seen,
            SymbolKind::Component,
            symbol_info(name, SymbolKind::Component, component_rule, decl_node, source),
        );
    }
    if is_hook {
        push_symbol(
            facts,
            seen,
            SymbolKind::Hook,
            symbol_info(name, SymbolKind::Hook, DetectionRule::HookName, decl_node, source),
        );
    }
}

fn symbol_info(
    name: &str,
    kind: SymbolKind,
    rule: DetectionRule,
    decl_node: Node,
    source: &str,
) -> SymbolInfo {
    let start = decl_node.start_byte();
    let end = decl_node.end_byte();
    SymbolInfo {
        name: name.to_owned(),
        kind,
        start,
        end,
        code: snippet_of(&source[start..end], SYMBOL_PREVIEW_CHARS),
        rule,
    }
}

fn push_symbol(facts: &mut FileFacts, seen: &mut SeenNames, kind: SymbolKind, info: SymbolInfo) {
    let (registry, bucket) = match kind {
        SymbolKind::Component => (&mut seen.components, &mut facts.components),
        SymbolKind::Hook => (&mut seen.hooks, &mut facts.hooks),
        SymbolKind::Context => (&mut seen.contexts, &mut facts.contexts),
    };
    if registry.insert(info.name.clone()) {
        bucket.push(info);
    }
}

// ---------------------------------------------------------------------------
// Usage facts
// ---------------------------------------------------------------------------

/// Inspect one JSX element for usage/provider facts and `<Route>` props.
fn record_element_facts(element: Node, source: &str, facts: &mut FileFacts) {
    let name = match element.child_by_field_name("name") {
        Some(n) => node_text(n, source),
        None => return,
    };

    if name == "Route" {
        facts.routes.push(extract_route_props(element, source));
    }

    if let Some((object, member)) = name.split_once('.') {
        // <Theme.Provider> provides the context bound to `Theme`.
        if member == "Provider" && !object.is_empty() {
            facts.providers.push(object.to_owned());
        }
        return;
    }

    if let Some(prefix) = name.strip_suffix("Provider")
        && !prefix.is_empty()
    {
        facts.providers.push(prefix.to_owned());
        return;
    }

    if starts_uppercase(name) {
        facts.uses.push(UsageFact::Component {
            name: name.to_owned(),
        });
    }
}

/// Inspect one call expression for hook / context-consumption facts.
fn record_call_facts(call: Node, source: &str, facts: &mut FileFacts) {
    let callee = match call.child_by_field_name("function") {
        Some(c) => c,
        None => return,
    };

    // `React.useContext(Ctx)` reduces to the member name; bare calls use the identifier.
    let callee_name = match callee.kind() {
        "identifier" => node_text(callee, source),
        "member_expression" => callee
            .child_by_field_name("property")
            .map(|p| node_text(p, source))
            .unwrap_or(""),
        _ => return,
    };

    if callee_name == "useContext"
        && let Some(arg) = first_call_argument(call)
        && arg.kind() == "identifier"
    {
        facts.uses.push(UsageFact::Context {
            name: node_text(arg, source).to_owned(),
        });
    }

    if is_hook_name(callee_name) {
        facts.uses.push(UsageFact::Hook {
            name: callee_name.to_owned(),
        });
    }
}

fn first_call_argument(call: Node) -> Option<Node> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let found = args.named_children(&mut cursor).next();
    found
}

/// Capture the attributes of a markup `<Route>` element.
///
/// String literals, bare identifiers, and nested elements
/// (`element={<Home/>}` records `"Home"`) are kept; anything else is dropped.
fn extract_route_props(element: Node, source: &str) -> RouteProps {
    let mut props = RouteProps::new();
    let mut cursor = element.walk();
    for child in element.children(&mut cursor) {
        if child.kind() != "jsx_attribute" {
            continue;
        }
        let mut attr_cursor = child.walk();
        let mut named = child.named_children(&mut attr_cursor);
        let key = match named.next() {
            Some(k) => node_text(k, source).to_owned(),
            None => continue,
        };
        let value = match named.next() {
            Some(v) => v,
            None => continue,
        };
        if let Some(text) = attribute_value_text(value, source) {
            props.insert(key, text);
        }
    }
    props
}

fn attribute_value_text(value: Node, source: &str) -> Option<String> {
    match value.kind() {
        "string" => Some(string_fragment_text(value, source)),
        "jsx_expression" => {
            let mut cursor = value.walk();
            let inner = value.named_children(&mut cursor).next()?;
            match inner.kind() {
                "identifier" => Some(node_text(inner, source).to_owned()),
                "jsx_self_closing_element" => inner
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_owned()),
                "jsx_element" => {
                    let mut el_cursor = inner.walk();
                    inner
                        .named_children(&mut el_cursor)
                        .find(|c| c.kind() == "jsx_opening_element")
                        .and_then(|open| open.child_by_field_name("name"))
                        .map(|n| node_text(n, source).to_owned())
                }
                _ => None,
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Helper utilities
// ---------------------------------------------------------------------------

fn node_text<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Concatenated `string_fragment` children of a `string` node (handles empty strings).
fn string_fragment_text(string_node: Node, source: &str) -> String {
    let mut out = String::new();
    let mut cursor = string_node.walk();
    for child in string_node.named_children(&mut cursor) {
        if child.kind() == "string_fragment" {
            out.push_str(node_text(child, source));
        }
    }
    out
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// `use` followed by an uppercase letter or digit: useAuth, use2FA.
pub fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// True for `createContext(...)` and `<qualifier>.createContext(...)`.
fn is_create_context_call(call: Node, source: &str) -> bool {
    let callee = match call.child_by_field_name("function") {
        Some(c) => c,
        None => return false,
    };
    match callee.kind() {
        "identifier" => node_text(callee, source) == "createContext",
        "member_expression" => callee
            .child_by_field_name("property")
            .map(|p| node_text(p, source) == "createContext")
            .unwrap_or(false),
        _ => false,
    }
}

/// Return true when the tree rooted at `node` contains a `jsx_element`,
/// `jsx_fragment`, or `jsx_self_closing_element` anywhere in its descendants.
fn contains_jsx(node: Node) -> bool {
    if matches!(
        node.kind(),
        "jsx_element" | "jsx_fragment" | "jsx_self_closing_element"
    ) {
        return true;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if contains_jsx(child) {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
