use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::config::FlowgraphConfig;
use crate::export::{GraphJson, graph_to_json};
use crate::graph::FlowGraph;
use crate::graph::node::FileRecord;
use crate::parser::{imports, language_for_extension, parse_source, symbols};
use crate::walker::walk_project;

/// Analyze a whole project tree into the serialized flow graph.
///
/// Phase one (read, parse, classify) runs per file on the rayon pool — files
/// share no mutable state. Phase two (the name index and all edge
/// resolution) starts only after every record exists; [`FlowGraph::build`]
/// re-sorts by path so worker-completion order never leaks into the output.
pub fn analyze_project(root: &Path, config: &FlowgraphConfig) -> Result<GraphJson> {
    let files = walk_project(root, config)?;

    let records: Vec<FileRecord> = files
        .par_iter()
        .filter_map(|path| load_record(root, path))
        .collect();

    Ok(graph_to_json(&FlowGraph::build(records)))
}

/// Single-file symbol mode: the same Graph JSON shape, built from one file.
///
/// The file's parent directory acts as the project root, so the node id is
/// the bare file name and every import lands on a package node.
pub fn analyze_file(path: &Path) -> Result<GraphJson> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rel_path = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_owned();
    let ext = extension_of(path);
    let record = build_record(rel_path, &ext, source);
    Ok(graph_to_json(&FlowGraph::build(vec![record])))
}

/// Read and classify one file. Read failures exclude the file from the node
/// set with a warning; the run continues.
fn load_record(root: &Path, path: &Path) -> Option<FileRecord> {
    let rel_path = rel_path_of(root, path);
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("warning: skipping {rel_path}: {err}");
            return None;
        }
    };
    let ext = extension_of(path);
    Some(build_record(rel_path, &ext, source))
}

/// Parse and classify one file's text. A file failing both parse tiers
/// contributes an empty-symbol record rather than aborting the run.
fn build_record(rel_path: String, ext: &str, source: String) -> FileRecord {
    let parsed = match parse_source(ext, source.as_bytes()) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("warning: {rel_path}: {err}; contributing empty symbol set");
            return FileRecord::empty(rel_path, source);
        }
    };

    let facts = symbols::classify(&parsed.tree, &source, &rel_path);
    let language = language_for_extension(parsed.grammar_ext)
        .expect("grammar_ext always names a supported grammar");
    let file_imports = imports::extract_imports(
        &parsed.tree,
        source.as_bytes(),
        &language,
        parsed.grammar_ext,
    );

    FileRecord {
        rel_path,
        source,
        components: facts.components,
        hooks: facts.hooks,
        contexts: facts.contexts,
        imports: file_imports,
        uses: facts.uses,
        providers: facts.providers,
        routes: facts.routes,
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_owned()
}

/// Project-root-relative path with `/` separators, regardless of platform.
fn rel_path_of(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_fixture_project(dir: &TempDir) {
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("hooks")).unwrap();
        fs::write(
            src.join("App.jsx"),
            r#"import React from "react";
import { useAuth } from "./hooks/useAuth";
import { ThemeContext } from "./ThemeContext";

export default function App() {
  const user = useAuth();
  const theme = React.useContext(ThemeContext);
  return (
    <ThemeContext.Provider value={theme}>
      <Dashboard />
    </ThemeContext.Provider>
  );
}
"#,
        )
        .unwrap();
        fs::write(
            src.join("hooks").join("useAuth.js"),
            "export function useAuth() { return null; }\n",
        )
        .unwrap();
        fs::write(
            src.join("ThemeContext.js"),
            "import { createContext } from \"react\";\nexport const ThemeContext = createContext(null);\n",
        )
        .unwrap();
    }

    fn node_ids(json: &crate::export::GraphJson) -> Vec<&str> {
        json.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_analyze_project_end_to_end() {
        let dir = TempDir::new().unwrap();
        write_fixture_project(&dir);
        let json = analyze_project(dir.path(), &FlowgraphConfig::default()).unwrap();

        assert_eq!(
            node_ids(&json),
            vec![
                "src/App.jsx",
                "src/ThemeContext.js",
                "src/hooks/useAuth.js",
                "pkg:react"
            ]
        );

        let types: Vec<&str> = json.edges.iter().map(|e| e.edge_type).collect();
        assert!(types.contains(&"import"));
        assert!(types.contains(&"import-package"));
        assert!(types.contains(&"uses-hook"));
        assert!(types.contains(&"uses-context"));
        assert!(types.contains(&"provides-context"));
        // <Dashboard/> has no declaring file — its usage fact is dropped.
        assert!(!types.contains(&"uses-component"));
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        write_fixture_project(&dir);
        let config = FlowgraphConfig::default();
        let a = serde_json::to_string(&analyze_project(dir.path(), &config).unwrap()).unwrap();
        let b = serde_json::to_string(&analyze_project(dir.path(), &config).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unparseable_file_degrades_to_empty_node() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.js"), "export const x = 1;").unwrap();
        fs::write(dir.path().join("broken.js"), "function ((( {{{").unwrap();

        let json = analyze_project(dir.path(), &FlowgraphConfig::default()).unwrap();
        assert_eq!(node_ids(&json), vec!["broken.js", "ok.js"]);
        assert!(json.edges.is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("missing");
        assert!(analyze_project(&gone, &FlowgraphConfig::default()).is_err());
    }

    #[test]
    fn test_analyze_file_single_node() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Card.jsx");
        fs::write(
            &file,
            "import styled from \"styled-components\";\nexport const Card = () => <div/>;\n",
        )
        .unwrap();

        let json = analyze_file(&file).unwrap();
        assert_eq!(node_ids(&json), vec!["Card.jsx", "pkg:styled-components"]);
        assert_eq!(json.nodes[0].node_type, "fileNode");
    }
}
