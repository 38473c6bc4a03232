pub mod edge;
pub mod node;

use std::collections::{BTreeSet, HashMap};

use petgraph::Directed;
use petgraph::stable_graph::{NodeIndex, StableGraph};

use crate::resolver::{Resolution, resolve_specifier};
use edge::EdgeKind;
use node::{FileRecord, GraphNode, PackageInfo, UsageFact};

/// The assembled flow graph: a directed petgraph StableGraph with O(1) lookup indexes.
pub struct FlowGraph {
    /// The underlying directed graph, parameterised over node and edge kinds.
    pub graph: StableGraph<GraphNode, EdgeKind, Directed>,
    /// Maps project-relative file paths to their node indices.
    pub file_index: HashMap<String, NodeIndex>,
    /// Maps raw unresolved specifiers to their synthesized package nodes.
    pub package_index: HashMap<String, NodeIndex>,
    /// Maps symbol names to the file node declaring them. Populated in
    /// sorted-path order; on a cross-file name collision the first file wins.
    pub name_index: HashMap<String, NodeIndex>,
}

impl FlowGraph {
    fn new() -> Self {
        FlowGraph {
            graph: StableGraph::new(),
            file_index: HashMap::new(),
            package_index: HashMap::new(),
            name_index: HashMap::new(),
        }
    }

    /// Build the graph from per-file records.
    ///
    /// Two-phase: all file nodes and the global name index are finalized
    /// before any edge is resolved — resolving incrementally would silently
    /// lose forward references to symbols declared in later files. Records
    /// are re-sorted by path here so the merge is deterministic regardless of
    /// the caller's enumeration or worker-completion order.
    pub fn build(mut records: Vec<FileRecord>) -> FlowGraph {
        records.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

        let paths: BTreeSet<String> = records.iter().map(|r| r.rel_path.clone()).collect();
        let mut flow = FlowGraph::new();

        // Phase one: file nodes (even empty-symbol ones) and the name index.
        for record in records {
            let rel_path = record.rel_path.clone();
            let names: Vec<String> = record.symbols().map(|s| s.name.clone()).collect();
            let idx = flow.graph.add_node(GraphNode::File(record));
            flow.file_index.insert(rel_path, idx);
            for name in names {
                flow.name_index.entry(name).or_insert(idx);
            }
        }

        // Phase two: import edges first, then usage/provider edges.
        let file_indices: Vec<NodeIndex> = {
            let mut v: Vec<(String, NodeIndex)> = flow
                .file_index
                .iter()
                .map(|(p, &i)| (p.clone(), i))
                .collect();
            v.sort();
            v.into_iter().map(|(_, i)| i).collect()
        };

        for &idx in &file_indices {
            let (rel_path, specifiers) = match &flow.graph[idx] {
                GraphNode::File(r) => (
                    r.rel_path.clone(),
                    r.imports.iter().map(|i| i.specifier.clone()).collect::<Vec<_>>(),
                ),
                GraphNode::Package(_) => continue,
            };
            for specifier in specifiers {
                match resolve_specifier(&specifier, &rel_path, &paths) {
                    Resolution::Project(target) => {
                        let target_idx = flow.file_index[&target];
                        flow.graph.add_edge(idx, target_idx, EdgeKind::Import { specifier });
                    }
                    Resolution::External(raw) => {
                        let pkg_idx = flow.intern_package(&raw);
                        flow.graph
                            .add_edge(idx, pkg_idx, EdgeKind::ImportPackage { specifier: raw });
                    }
                }
            }
        }

        for &idx in &file_indices {
            let (uses, providers) = match &flow.graph[idx] {
                GraphNode::File(r) => (r.uses.clone(), r.providers.clone()),
                GraphNode::Package(_) => continue,
            };
            for fact in uses {
                // Unresolved usage facts are expected (symbols living in
                // unanalyzed packages) and dropped without a diagnostic.
                let Some(&target) = flow.name_index.get(fact.name()) else {
                    continue;
                };
                let kind = match fact {
                    UsageFact::Hook { name } => EdgeKind::UsesHook { name },
                    UsageFact::Context { name } => EdgeKind::UsesContext { name },
                    UsageFact::Component { name } => EdgeKind::UsesComponent { name },
                };
                flow.graph.add_edge(idx, target, kind);
            }
            for name in providers {
                let Some(&target) = flow.name_index.get(&name) else {
                    continue;
                };
                flow.graph
                    .add_edge(idx, target, EdgeKind::ProvidesContext { name });
            }
        }

        flow
    }

    /// Get or create the package node for an unresolved specifier.
    /// Deduplicated by specifier text.
    fn intern_package(&mut self, specifier: &str) -> NodeIndex {
        if let Some(&existing) = self.package_index.get(specifier) {
            return existing;
        }
        let idx = self.graph.add_node(GraphNode::Package(PackageInfo {
            specifier: specifier.to_owned(),
        }));
        self.package_index.insert(specifier.to_owned(), idx);
        idx
    }

    /// Number of file nodes in the graph.
    pub fn file_count(&self) -> usize {
        self.file_index.len()
    }

    /// Number of synthesized package nodes.
    pub fn package_count(&self) -> usize {
        self.package_index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{DetectionRule, SymbolInfo, SymbolKind};
    use crate::parser::imports::{ImportInfo, ImportKind};
    use petgraph::visit::{EdgeRef, IntoEdgeReferences};

    fn record(rel_path: &str) -> FileRecord {
        FileRecord::empty(rel_path.to_owned(), String::new())
    }

    fn symbol(name: &str, kind: SymbolKind) -> SymbolInfo {
        SymbolInfo {
            name: name.to_owned(),
            kind,
            start: 0,
            end: 0,
            code: String::new(),
            rule: match kind {
                SymbolKind::Component => DetectionRule::FunctionJsx,
                SymbolKind::Hook => DetectionRule::HookName,
                SymbolKind::Context => DetectionRule::ContextCall,
            },
        }
    }

    fn import(specifier: &str) -> ImportInfo {
        ImportInfo {
            kind: ImportKind::Esm,
            specifier: specifier.to_owned(),
            bindings: Vec::new(),
        }
    }

    fn edges_of(flow: &FlowGraph) -> Vec<(NodeIndex, NodeIndex, EdgeKind)> {
        flow.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight().clone()))
            .collect()
    }

    #[test]
    fn test_import_edge_resolves_to_file_never_package() {
        let mut a = record("src/App.jsx");
        a.imports.push(import("./Sidebar"));
        let b = record("src/Sidebar.jsx");
        let flow = FlowGraph::build(vec![a, b]);

        assert_eq!(flow.package_count(), 0, "resolved import must not synthesize a package");
        let edges = edges_of(&flow);
        assert_eq!(edges.len(), 1);
        assert!(matches!(&edges[0].2, EdgeKind::Import { specifier } if specifier == "./Sidebar"));
        assert_eq!(edges[0].1, flow.file_index["src/Sidebar.jsx"]);
    }

    #[test]
    fn test_unresolved_import_synthesizes_package_node() {
        let mut a = record("src/App.jsx");
        a.imports.push(import("./gone"));
        let flow = FlowGraph::build(vec![a]);

        assert_eq!(flow.package_count(), 1);
        let edges = edges_of(&flow);
        assert!(
            matches!(&edges[0].2, EdgeKind::ImportPackage { specifier } if specifier == "./gone")
        );
        assert_eq!(edges[0].1, flow.package_index["./gone"]);
    }

    #[test]
    fn test_package_nodes_dedup_by_specifier() {
        let mut a = record("src/a.js");
        a.imports.push(import("left-pad"));
        let mut b = record("src/b.js");
        b.imports.push(import("left-pad"));
        let flow = FlowGraph::build(vec![a, b]);

        assert_eq!(flow.package_count(), 1, "one package node per distinct specifier");
        let pkg_edges = edges_of(&flow)
            .into_iter()
            .filter(|(_, _, k)| matches!(k, EdgeKind::ImportPackage { .. }))
            .count();
        assert_eq!(pkg_edges, 2, "both importers keep their own edge");
    }

    #[test]
    fn test_name_collision_first_sorted_path_wins() {
        let mut early = record("src/a/Foo.jsx");
        early.components.push(symbol("Foo", SymbolKind::Component));
        let mut late = record("src/z/Foo.jsx");
        late.components.push(symbol("Foo", SymbolKind::Component));
        let mut user = record("src/m/App.jsx");
        user.uses.push(UsageFact::Component { name: "Foo".into() });

        // Deliberately unsorted input: the builder must sort before merging.
        let flow = FlowGraph::build(vec![late, user, early]);
        let edges = edges_of(&flow);
        let uses: Vec<_> = edges
            .iter()
            .filter(|(_, _, k)| matches!(k, EdgeKind::UsesComponent { .. }))
            .collect();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].1, flow.file_index["src/a/Foo.jsx"]);
    }

    #[test]
    fn test_unresolved_usage_facts_are_silently_dropped() {
        let mut a = record("src/App.jsx");
        a.uses.push(UsageFact::Hook { name: "useQuery".into() });
        let flow = FlowGraph::build(vec![a]);
        assert!(edges_of(&flow).is_empty());
    }

    #[test]
    fn test_usage_edges_are_not_deduplicated() {
        let mut hooks = record("src/hooks.js");
        hooks.hooks.push(symbol("useAuth", SymbolKind::Hook));
        let mut a = record("src/App.jsx");
        a.uses.push(UsageFact::Hook { name: "useAuth".into() });
        a.uses.push(UsageFact::Hook { name: "useAuth".into() });
        let flow = FlowGraph::build(vec![a, hooks]);
        let hook_edges = edges_of(&flow)
            .into_iter()
            .filter(|(_, _, k)| matches!(k, EdgeKind::UsesHook { .. }))
            .count();
        assert_eq!(hook_edges, 2);
    }

    #[test]
    fn test_provider_edge_targets_context_file() {
        let mut ctx = record("src/ThemeContext.js");
        ctx.contexts.push(symbol("ThemeContext", SymbolKind::Context));
        let mut app = record("src/App.jsx");
        app.providers.push("ThemeContext".into());
        let flow = FlowGraph::build(vec![app, ctx]);
        let edges = edges_of(&flow);
        assert_eq!(edges.len(), 1);
        assert!(
            matches!(&edges[0].2, EdgeKind::ProvidesContext { name } if name == "ThemeContext")
        );
        assert_eq!(edges[0].1, flow.file_index["src/ThemeContext.js"]);
    }

    #[test]
    fn test_empty_symbol_file_still_gets_a_node() {
        let flow = FlowGraph::build(vec![record("src/broken.js")]);
        assert_eq!(flow.file_count(), 1);
    }

    #[test]
    fn test_every_edge_endpoint_is_a_live_node() {
        let mut a = record("src/App.jsx");
        a.imports.push(import("react"));
        a.uses.push(UsageFact::Component { name: "Gone".into() });
        let flow = FlowGraph::build(vec![a]);
        for (source, target, _) in edges_of(&flow) {
            assert!(flow.graph.node_weight(source).is_some());
            assert!(flow.graph.node_weight(target).is_some());
        }
    }
}
