/// The kind of directed edge between two nodes in the flow graph.
///
/// Edges are append-only: multiple usages of the same symbol in one file each
/// produce their own edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    /// File -> File: the source file imports the target project file.
    /// `specifier` is the raw import path string as written in source.
    Import { specifier: String },
    /// File -> Package: the source file imports an unresolved specifier.
    ImportPackage { specifier: String },
    /// File -> File: the source file calls a hook declared in the target file.
    UsesHook { name: String },
    /// File -> File: the source file reads a context declared in the target file.
    UsesContext { name: String },
    /// File -> File: the source file renders a component declared in the target file.
    UsesComponent { name: String },
    /// File -> File: the source file renders a Provider for a context declared
    /// in the target file.
    ProvidesContext { name: String },
}

impl EdgeKind {
    /// The `type` string used in serialized graph output.
    pub fn type_label(&self) -> &'static str {
        match self {
            EdgeKind::Import { .. } => "import",
            EdgeKind::ImportPackage { .. } => "import-package",
            EdgeKind::UsesHook { .. } => "uses-hook",
            EdgeKind::UsesContext { .. } => "uses-context",
            EdgeKind::UsesComponent { .. } => "uses-component",
            EdgeKind::ProvidesContext { .. } => "provides-context",
        }
    }
}
