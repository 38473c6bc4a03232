use std::collections::BTreeSet;

/// Extensions probed when a specifier omits one, in probe order.
const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

/// The outcome of resolving a single import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Resolved to a loaded project file (project-root-relative path).
    Project(String),
    /// Not resolvable to a loaded file; the raw specifier becomes a package node.
    External(String),
}

/// Resolve an import specifier against the set of loaded project files.
///
/// Relative and absolute specifiers are probed in order: the exact path, the
/// path with each recognised source extension appended, then an index file
/// under each extension. The first candidate present in `files` wins. Bare
/// specifiers are returned unchanged as [`Resolution::External`].
///
/// This is a deliberate heuristic approximation of module resolution — no
/// package manifests, no tsconfig path mappings. Probing runs against the
/// loaded file set rather than the filesystem, so an import of a file the
/// loader skipped is external by definition (it can never be an edge target).
pub fn resolve_specifier(specifier: &str, importer: &str, files: &BTreeSet<String>) -> Resolution {
    let base = if let Some(rooted) = specifier.strip_prefix('/') {
        // Absolute specifiers are taken as project-root-relative.
        normalize(rooted)
    } else if specifier.starts_with("./") || specifier.starts_with("../") {
        let parent = match importer.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        };
        if parent.is_empty() {
            normalize(specifier)
        } else {
            normalize(&format!("{parent}/{specifier}"))
        }
    } else {
        return Resolution::External(specifier.to_owned());
    };

    for candidate in candidates(&base) {
        if files.contains(&candidate) {
            return Resolution::Project(candidate);
        }
    }
    Resolution::External(specifier.to_owned())
}

fn candidates(base: &str) -> impl Iterator<Item = String> {
    let exact = std::iter::once(base.to_owned());
    let with_ext = SOURCE_EXTENSIONS.iter().map(move |ext| format!("{base}.{ext}"));
    let index = SOURCE_EXTENSIONS
        .iter()
        .map(move |ext| format!("{base}/index.{ext}"));
    exact.chain(with_ext).chain(index)
}

/// Collapse `.` and `..` components lexically. Leading `..` that would escape
/// the project root are dropped rather than preserved.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_exact_path_wins() {
        let set = files(&["src/utils.js"]);
        assert_eq!(
            resolve_specifier("./utils.js", "src/App.jsx", &set),
            Resolution::Project("src/utils.js".into())
        );
    }

    #[test]
    fn test_extension_probing_order() {
        let set = files(&["src/utils.jsx", "src/utils.ts"]);
        // .jsx is probed before .ts.
        assert_eq!(
            resolve_specifier("./utils", "src/App.jsx", &set),
            Resolution::Project("src/utils.jsx".into())
        );
    }

    #[test]
    fn test_index_probing() {
        let set = files(&["src/components/index.ts"]);
        assert_eq!(
            resolve_specifier("./components", "src/App.tsx", &set),
            Resolution::Project("src/components/index.ts".into())
        );
    }

    #[test]
    fn test_parent_traversal() {
        let set = files(&["src/hooks/useAuth.js"]);
        assert_eq!(
            resolve_specifier("../hooks/useAuth", "src/pages/Login.jsx", &set),
            Resolution::Project("src/hooks/useAuth.js".into())
        );
    }

    #[test]
    fn test_bare_specifier_is_external() {
        let set = files(&["src/react.js"]);
        assert_eq!(
            resolve_specifier("react", "src/App.jsx", &set),
            Resolution::External("react".into())
        );
    }

    #[test]
    fn test_unresolved_relative_is_external_with_raw_specifier() {
        let set = files(&["src/App.jsx"]);
        assert_eq!(
            resolve_specifier("./gone", "src/App.jsx", &set),
            Resolution::External("./gone".into())
        );
    }

    #[test]
    fn test_absolute_specifier_resolves_from_root() {
        let set = files(&["src/api.ts"]);
        assert_eq!(
            resolve_specifier("/src/api", "pages/Home.tsx", &set),
            Resolution::Project("src/api.ts".into())
        );
    }
}
