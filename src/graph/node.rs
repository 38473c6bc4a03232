use std::collections::BTreeMap;

/// The kind of symbol the classifier can discover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// A capitalized function/class/const whose body produces JSX.
    Component,
    /// A function named `use` + uppercase letter or digit.
    Hook,
    /// An identifier bound to the result of a `createContext(...)` call.
    Context,
}

/// The heuristic that matched a symbol, recorded for downstream inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionRule {
    /// `function Foo() { return <div/> }`
    FunctionJsx,
    /// `class Foo extends ... { render() { return <div/> } }`
    ClassJsx,
    /// `const Foo = () => <div/>` (arrow or function expression value)
    ArrowJsx,
    /// `function useThing() { ... }` / `const useThing = () => ...`
    HookName,
    /// `const Ctx = createContext(...)` (bare or qualified callee)
    ContextCall,
}

/// A Component, Hook, or Context declaration discovered in one file.
///
/// Identity is `(file, name)`; names are unique within their declaring file.
/// `start`/`end` are byte offsets into the file's raw text so the original
/// source can be re-sliced later; the classifier never discards this range.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Byte offset of the declaration's first byte.
    pub start: usize,
    /// Byte offset one past the declaration's last byte.
    pub end: usize,
    /// Truncated code preview (see `export::snippet_of`).
    pub code: String,
    /// Which heuristic matched.
    pub rule: DetectionRule,
}

/// A reference to a symbol observed while scanning a file's body.
///
/// Usage facts are append-only and deliberately not deduplicated: each
/// occurrence later produces its own edge.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UsageFact {
    /// A capitalized JSX element: `<Sidebar/>`.
    Component { name: String },
    /// A call to a `use*` function: `useAuth()`.
    Hook { name: String },
    /// A `useContext(Ident)` call; `name` is the context identifier.
    Context { name: String },
}

impl UsageFact {
    pub fn name(&self) -> &str {
        match self {
            UsageFact::Component { name } | UsageFact::Hook { name } | UsageFact::Context { name } => name,
        }
    }
}

/// Attributes captured from a markup `<Route .../>` element.
///
/// Keys are attribute names; values are string literals, identifiers, or the
/// name of a nested element (`element={<Home/>}` records `"Home"`).
pub type RouteProps = BTreeMap<String, String>;

/// Everything the classifier and import extractor learned about one file.
///
/// Built once per run, immutable after construction, owned by the graph
/// builder during assembly.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Project-root-relative path with `/` separators — doubles as the node id.
    pub rel_path: String,
    /// Raw file text.
    pub source: String,
    pub components: Vec<SymbolInfo>,
    pub hooks: Vec<SymbolInfo>,
    pub contexts: Vec<SymbolInfo>,
    pub imports: Vec<crate::parser::imports::ImportInfo>,
    pub uses: Vec<UsageFact>,
    /// Context names provided via `<X.Provider>` / `<XProvider>` elements.
    pub providers: Vec<String>,
    /// Markup `<Route>` element props.
    pub routes: Vec<RouteProps>,
}

impl FileRecord {
    /// An empty record for a file that failed both parse tiers. The file still
    /// contributes a node; it just declares and references nothing.
    pub fn empty(rel_path: String, source: String) -> Self {
        FileRecord {
            rel_path,
            source,
            components: Vec::new(),
            hooks: Vec::new(),
            contexts: Vec::new(),
            imports: Vec::new(),
            uses: Vec::new(),
            providers: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// All declared symbols in classification order (components, hooks, contexts).
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolInfo> {
        self.components
            .iter()
            .chain(self.hooks.iter())
            .chain(self.contexts.iter())
    }
}

/// Truncate a code slice to at most `limit` characters, appending an ellipsis
/// marker when anything was cut. Operates on chars, never splitting a
/// multi-byte sequence.
pub fn snippet_of(code: &str, limit: usize) -> String {
    let mut out = String::new();
    for (taken, ch) in code.chars().enumerate() {
        if taken == limit {
            out.push('…');
            return out;
        }
        out.push(ch);
    }
    out
}

/// Metadata for a synthesized external-package node.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PackageInfo {
    /// The unresolved import specifier, verbatim (e.g. "react", "./gone").
    pub specifier: String,
}

/// A node in the flow graph — a project file or an external package.
///
/// Package nodes are synthesized lazily, one per distinct unresolved
/// specifier, and never duplicated.
#[derive(Debug, Clone)]
pub enum GraphNode {
    File(FileRecord),
    Package(PackageInfo),
}
