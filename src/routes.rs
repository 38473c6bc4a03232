use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use tree_sitter::Node;

use crate::parser::parse_source;

/// HTTP methods recognised on a route-registration call.
const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch"];

/// The four request-field buckets a handler can read from.
///
/// Buckets never contain duplicates; insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RequiredFields {
    pub params: Vec<String>,
    pub query: Vec<String>,
    pub body: Vec<String>,
    pub headers: Vec<String>,
}

impl RequiredFields {
    fn bucket_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        match name {
            "params" => Some(&mut self.params),
            "query" => Some(&mut self.query),
            "body" => Some(&mut self.body),
            "headers" => Some(&mut self.headers),
            _ => None,
        }
    }

    fn insert(&mut self, bucket: &str, field: &str) {
        if let Some(b) = self.bucket_mut(bucket)
            && !b.iter().any(|f| f == field)
        {
            b.push(field.to_owned());
        }
    }
}

/// The statically inferred shape of one registered route.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RouteDescriptor {
    pub method: String,
    pub path: String,
    pub required: RequiredFields,
}

/// Infer the routes registered in one file.
///
/// The only hard failure is an unreadable file; everything downstream degrades
/// to partial output (see [`infer_routes_from_source`]).
pub fn infer_routes(path: &Path) -> Result<Vec<RouteDescriptor>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("js")
        .to_owned();
    Ok(infer_routes_from_source(&ext, &source))
}

/// Structural route extraction with a text-pattern safety net.
///
/// Walks the syntax tree for `<appVar>.<method>(pathArg, ...handlers)` calls
/// and infers required request fields from each final handler argument. When
/// structural extraction yields zero routes — typically because both parse
/// tiers failed — a regex scan over the raw text recovers a best-effort route
/// list with empty field sets, so a caller never gets an empty answer purely
/// due to a syntax error. Final result is deduplicated by `(method, path)`,
/// first occurrence wins.
pub fn infer_routes_from_source(ext: &str, source: &str) -> Vec<RouteDescriptor> {
    let mut routes = Vec::new();

    match parse_source(ext, source.as_bytes()) {
        Ok(parsed) => collect_routes(parsed.tree.root_node(), source, &mut routes),
        Err(err) => eprintln!("warning: structural route extraction unavailable: {err}"),
    }

    if routes.is_empty() {
        routes = scan_route_text(source);
    }

    dedupe_routes(routes)
}

fn dedupe_routes(routes: Vec<RouteDescriptor>) -> Vec<RouteDescriptor> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    routes
        .into_iter()
        .filter(|r| seen.insert((r.method.clone(), r.path.clone())))
        .collect()
}

// ---------------------------------------------------------------------------
// Structural extraction
// ---------------------------------------------------------------------------

fn collect_routes(node: Node, source: &str, out: &mut Vec<RouteDescriptor>) {
    if node.kind() == "call_expression"
        && let Some(route) = route_from_call(node, source)
    {
        out.push(route);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_routes(child, source, out);
    }
}

/// Match one `<appVar>.<httpMethod>(pathArg, ...handlers)` call.
///
/// Skipped (not an error) when the callee shape differs or the path argument
/// is not a plain literal — dynamically constructed paths are a non-goal.
fn route_from_call(call: Node, source: &str) -> Option<RouteDescriptor> {
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != "member_expression" {
        return None;
    }
    let object = callee.child_by_field_name("object")?;
    if object.kind() != "identifier" {
        return None;
    }
    let method = node_text(callee.child_by_field_name("property")?, source);
    if !HTTP_METHODS.contains(&method) {
        return None;
    }

    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let arg_nodes: Vec<Node> = args.named_children(&mut cursor).collect();
    let path_arg = arg_nodes.first()?;
    let path = literal_path(*path_arg, source)?;

    // The final argument is the handler; identifier handlers (declared
    // elsewhere) and handler-less registrations contribute empty buckets.
    let mut required = RequiredFields::default();
    if let Some(handler) = arg_nodes.last()
        && arg_nodes.len() > 1
        && matches!(
            handler.kind(),
            "arrow_function" | "function" | "function_expression"
        )
    {
        extract_required_fields(*handler, source, &mut required);
    }

    Some(RouteDescriptor {
        method: method.to_owned(),
        path: normalize_path(&path),
        required,
    })
}

/// A plain string literal, or a template literal with no interpolation.
fn literal_path(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "string" => Some(fragments_text(node, source)),
        "template_string" => {
            let mut cursor = node.walk();
            if node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution")
            {
                return None;
            }
            Some(fragments_text(node, source))
        }
        _ => None,
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// Walk a handler body for the two request-field-reading shapes:
/// two-level member access `req.<bucket>.<field>` and destructuring
/// `const { a, b } = req.<bucket>` (tolerating an `|| {}` / `?? {}` guard).
fn extract_required_fields(handler: Node, source: &str, required: &mut RequiredFields) {
    let req_var = request_var_name(handler, source);
    let Some(body) = handler.child_by_field_name("body") else {
        return;
    };
    walk_handler(body, source, &req_var, required);
}

/// The handler's first parameter name when it is a plain identifier, else "req".
fn request_var_name(handler: Node, source: &str) -> String {
    // Single unparenthesised arrow parameter: `req => ...`
    if let Some(param) = handler.child_by_field_name("parameter")
        && param.kind() == "identifier"
    {
        return node_text(param, source).to_owned();
    }
    if let Some(params) = handler.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        if let Some(first) = params.named_children(&mut cursor).next() {
            if first.kind() == "identifier" {
                return node_text(first, source).to_owned();
            }
            // TS grammar wraps each parameter: (required_parameter pattern: (identifier)).
            if let Some(pattern) = first.child_by_field_name("pattern")
                && pattern.kind() == "identifier"
            {
                return node_text(pattern, source).to_owned();
            }
        }
    }
    "req".to_owned()
}

fn walk_handler(node: Node, source: &str, req_var: &str, required: &mut RequiredFields) {
    match node.kind() {
        "member_expression" => {
            // req.<bucket>.<field>
            if let (Some(object), Some(property)) = (
                node.child_by_field_name("object"),
                node.child_by_field_name("property"),
            ) && let Some(bucket) = request_bucket(object, source, req_var)
            {
                required.insert(bucket, node_text(property, source));
            }
        }
        "variable_declarator" => {
            // const { a, b } = req.<bucket> [|| {}]
            if let (Some(name), Some(value)) = (
                node.child_by_field_name("name"),
                node.child_by_field_name("value"),
            ) && name.kind() == "object_pattern"
                && let Some(bucket) = request_bucket(unwrap_guard(value, source), source, req_var)
            {
                collect_pattern_fields(name, source, bucket, required);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_handler(child, source, req_var, required);
    }
}

/// If `node` is `<req_var>.<bucket>`, return the bucket name.
fn request_bucket<'a>(node: Node<'a>, source: &'a str, req_var: &str) -> Option<&'a str> {
    if node.kind() != "member_expression" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    if object.kind() != "identifier" || node_text(object, source) != req_var {
        return None;
    }
    let bucket = node_text(node.child_by_field_name("property")?, source);
    matches!(bucket, "params" | "query" | "body" | "headers").then_some(bucket)
}

/// Strip an `X || {}` / `X ?? {}` guard from a destructuring initializer.
fn unwrap_guard<'t>(node: Node<'t>, source: &str) -> Node<'t> {
    if node.kind() == "binary_expression"
        && let Some(op) = node.child_by_field_name("operator")
        && matches!(node_text(op, source), "||" | "??")
        && let Some(left) = node.child_by_field_name("left")
    {
        return left;
    }
    node
}

fn collect_pattern_fields(
    pattern: Node,
    source: &str,
    bucket: &str,
    required: &mut RequiredFields,
) {
    let mut cursor = pattern.walk();
    for prop in pattern.named_children(&mut cursor) {
        match prop.kind() {
            "shorthand_property_identifier_pattern" => {
                required.insert(bucket, node_text(prop, source));
            }
            "pair_pattern" => {
                if let Some(key) = prop.child_by_field_name("key") {
                    required.insert(bucket, node_text(key, source));
                }
            }
            // `{ limit = 20 }` — defaulted shorthand.
            "object_assignment_pattern" => {
                if let Some(left) = prop.child_by_field_name("left") {
                    required.insert(bucket, node_text(left, source));
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Text-pattern fallback
// ---------------------------------------------------------------------------

static FALLBACK_RE: OnceLock<Regex> = OnceLock::new();

fn fallback_re() -> &'static Regex {
    FALLBACK_RE.get_or_init(|| {
        Regex::new(r#"\b[A-Za-z_$][A-Za-z0-9_$]*\.(get|post|put|delete|patch)\s*\(\s*["'`]([^"'`]+)["'`]"#)
            .expect("invalid fallback route regex")
    })
}

/// Best-effort text scan for `<appVar>.<method>("<path>"` registrations.
fn scan_route_text(source: &str) -> Vec<RouteDescriptor> {
    fallback_re()
        .captures_iter(source)
        .map(|caps| RouteDescriptor {
            method: caps[1].to_owned(),
            path: normalize_path(&caps[2]),
            required: RequiredFields::default(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn node_text<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Concatenated fragment text of a `string` or `template_string` node.
fn fragments_text(node: Node, source: &str) -> String {
    let mut out = String::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "string_fragment" {
            out.push_str(node_text(child, source));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
