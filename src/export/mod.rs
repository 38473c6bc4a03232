use std::collections::HashMap;

use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::Serialize;

use crate::graph::FlowGraph;
use crate::graph::edge::EdgeKind;
use crate::graph::node::{GraphNode, RouteProps, SymbolInfo, UsageFact, snippet_of};
use crate::parser::imports::ImportInfo;

/// Maximum characters retained in a file node's code preview.
const FILE_PREVIEW_CHARS: usize = 1200;

/// The serialized graph: `{ nodes: [...], edges: [...] }`.
#[derive(Debug, Serialize)]
pub struct GraphJson {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

#[derive(Debug, Serialize)]
pub struct ExportNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub data: NodeData,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum NodeData {
    File(Box<FileNodeData>),
    Package(PackageNodeData),
}

#[derive(Debug, Serialize)]
pub struct FileNodeData {
    /// File basename, shown as the node label.
    pub label: String,
    #[serde(rename = "relPath")]
    pub rel_path: String,
    /// One-line human-readable digest of the file's contents.
    pub summary: String,
    pub symbols: SymbolBuckets,
    pub uses: Vec<UsageFact>,
    pub imports: Vec<ImportEntry>,
    pub providers: Vec<ProviderEntry>,
    pub routes: Vec<RouteProps>,
    /// Truncated preview of the file's raw text.
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct SymbolBuckets {
    pub components: Vec<SymbolInfo>,
    pub hooks: Vec<SymbolInfo>,
    pub contexts: Vec<SymbolInfo>,
}

#[derive(Debug, Serialize)]
pub struct ImportEntry {
    /// The raw specifier as written in source.
    pub source: String,
    /// Local binding names introduced by this import.
    pub names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProviderEntry {
    #[serde(rename = "providerFor")]
    pub provider_for: String,
}

#[derive(Debug, Serialize)]
pub struct PackageNodeData {
    pub label: String,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ExportEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: &'static str,
    pub data: EdgeData,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EdgeData {
    /// Import edges carry the raw specifier.
    Raw { raw: String },
    /// Usage/provider edges carry the symbol name.
    Name { name: String },
}

/// Render the flow graph into its serialized form.
///
/// Node order is files in sorted-path order followed by package nodes in
/// sorted-specifier order; edge order follows insertion order. Both are
/// functions of the input alone, so re-running on an unchanged tree emits
/// byte-identical JSON.
pub fn graph_to_json(flow: &FlowGraph) -> GraphJson {
    let mut ids: HashMap<NodeIndex, String> = HashMap::new();
    let mut nodes = Vec::new();

    let mut file_entries: Vec<(&String, NodeIndex)> =
        flow.file_index.iter().map(|(p, &i)| (p, i)).collect();
    file_entries.sort();
    for (rel_path, idx) in file_entries {
        let GraphNode::File(record) = &flow.graph[idx] else {
            continue;
        };
        ids.insert(idx, rel_path.clone());
        nodes.push(ExportNode {
            id: rel_path.clone(),
            node_type: "fileNode",
            data: NodeData::File(Box::new(FileNodeData {
                label: basename(rel_path).to_owned(),
                rel_path: rel_path.clone(),
                summary: summarize(record),
                symbols: SymbolBuckets {
                    components: record.components.clone(),
                    hooks: record.hooks.clone(),
                    contexts: record.contexts.clone(),
                },
                uses: record.uses.clone(),
                imports: record.imports.iter().map(import_entry).collect(),
                providers: record
                    .providers
                    .iter()
                    .map(|name| ProviderEntry {
                        provider_for: name.clone(),
                    })
                    .collect(),
                routes: record.routes.clone(),
                code: snippet_of(&record.source, FILE_PREVIEW_CHARS),
            })),
        });
    }

    let mut package_entries: Vec<(&String, NodeIndex)> =
        flow.package_index.iter().map(|(s, &i)| (s, i)).collect();
    package_entries.sort();
    for (specifier, idx) in package_entries {
        let id = format!("pkg:{specifier}");
        ids.insert(idx, id.clone());
        nodes.push(ExportNode {
            id,
            node_type: "packageNode",
            data: NodeData::Package(PackageNodeData {
                label: specifier.clone(),
                description: "external package",
            }),
        });
    }

    let edges = flow
        .graph
        .edge_references()
        .map(|e| {
            let source = ids[&e.source()].clone();
            let target = ids[&e.target()].clone();
            let (id, data) = match e.weight() {
                EdgeKind::Import { specifier } | EdgeKind::ImportPackage { specifier } => (
                    format!("imp-{source}-{target}"),
                    EdgeData::Raw {
                        raw: specifier.clone(),
                    },
                ),
                EdgeKind::UsesHook { name } => (
                    format!("hook-{source}-{target}-{name}"),
                    EdgeData::Name { name: name.clone() },
                ),
                EdgeKind::UsesContext { name } => (
                    format!("ctx-{source}-{target}-{name}"),
                    EdgeData::Name { name: name.clone() },
                ),
                EdgeKind::UsesComponent { name } => (
                    format!("uses-{source}-{target}-{name}"),
                    EdgeData::Name { name: name.clone() },
                ),
                EdgeKind::ProvidesContext { name } => (
                    format!("prov-{source}-{target}-{name}"),
                    EdgeData::Name { name: name.clone() },
                ),
            };
            ExportEdge {
                id,
                source,
                target,
                edge_type: e.weight().type_label(),
                data,
            }
        })
        .collect();

    GraphJson { nodes, edges }
}

fn import_entry(import: &ImportInfo) -> ImportEntry {
    ImportEntry {
        source: import.specifier.clone(),
        names: import.bindings.iter().map(|b| b.local.clone()).collect(),
    }
}

fn basename(rel_path: &str) -> &str {
    rel_path.rsplit('/').next().unwrap_or(rel_path)
}

/// Assemble the bullet-joined digest line from the non-empty buckets.
fn summarize(record: &crate::graph::node::FileRecord) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !record.components.is_empty() {
        parts.push(format!("Components: {}", names_of(&record.components)));
    }
    if !record.hooks.is_empty() {
        parts.push(format!("Hooks: {}", names_of(&record.hooks)));
    }
    if !record.contexts.is_empty() {
        parts.push(format!("Contexts: {}", names_of(&record.contexts)));
    }
    if !record.routes.is_empty() {
        let rendered: Vec<String> = record
            .routes
            .iter()
            .map(|props| serde_json::to_string(props).unwrap_or_default())
            .collect();
        parts.push(format!("Routes: {}", rendered.join("; ")));
    }
    parts.join(" • ")
}

fn names_of(symbols: &[SymbolInfo]) -> String {
    symbols
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{DetectionRule, FileRecord, SymbolKind};
    use crate::parser::imports::{ImportBinding, ImportKind};

    fn fixture_graph() -> FlowGraph {
        let mut app = FileRecord::empty("src/App.jsx".into(), "const App = 1;".into());
        app.components.push(SymbolInfo {
            name: "App".into(),
            kind: SymbolKind::Component,
            start: 0,
            end: 14,
            code: "const App = 1;".into(),
            rule: DetectionRule::ArrowJsx,
        });
        app.imports.push(ImportInfo {
            kind: ImportKind::Esm,
            specifier: "react".into(),
            bindings: vec![ImportBinding {
                local: "React".into(),
                imported: "default".into(),
            }],
        });
        app.imports.push(ImportInfo {
            kind: ImportKind::Esm,
            specifier: "./theme".into(),
            bindings: Vec::new(),
        });
        let theme = FileRecord::empty("src/theme.js".into(), String::new());
        FlowGraph::build(vec![app, theme])
    }

    #[test]
    fn test_node_ids_and_types() {
        let json = graph_to_json(&fixture_graph());
        let ids: Vec<&str> = json.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["src/App.jsx", "src/theme.js", "pkg:react"]);
        assert_eq!(json.nodes[0].node_type, "fileNode");
        assert_eq!(json.nodes[2].node_type, "packageNode");
    }

    #[test]
    fn test_edge_shapes() {
        let json = graph_to_json(&fixture_graph());
        assert_eq!(json.edges.len(), 2);
        let types: Vec<&str> = json.edges.iter().map(|e| e.edge_type).collect();
        assert!(types.contains(&"import"));
        assert!(types.contains(&"import-package"));
        let pkg_edge = json
            .edges
            .iter()
            .find(|e| e.edge_type == "import-package")
            .unwrap();
        assert_eq!(pkg_edge.target, "pkg:react");
        assert_eq!(pkg_edge.id, "imp-src/App.jsx-pkg:react");
    }

    #[test]
    fn test_summary_and_label() {
        let json = graph_to_json(&fixture_graph());
        let ExportNode { data: NodeData::File(data), .. } = &json.nodes[0] else {
            panic!("expected file node first");
        };
        assert_eq!(data.label, "App.jsx");
        assert_eq!(data.summary, "Components: App");
        assert_eq!(data.imports.len(), 2);
        assert_eq!(data.imports[0].source, "react");
        assert_eq!(data.imports[0].names, vec!["React"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = graph_to_json(&fixture_graph());
        let value = serde_json::to_value(&json).unwrap();
        let node = &value["nodes"][0];
        assert_eq!(node["type"], "fileNode");
        assert!(node["data"]["relPath"].is_string());
        assert!(node["data"]["symbols"]["components"].is_array());
        assert_eq!(
            node["data"]["symbols"]["components"][0]["kind"],
            "component"
        );
        let edge = &value["edges"][0];
        assert!(edge["data"]["raw"].is_string() || edge["data"]["name"].is_string());
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let a = serde_json::to_string(&graph_to_json(&fixture_graph())).unwrap();
        let b = serde_json::to_string(&graph_to_json(&fixture_graph())).unwrap();
        assert_eq!(a, b);
    }
}
