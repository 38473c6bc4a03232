use std::path::Path;

use serde::Deserialize;

/// Configuration loaded from `flowgraph.toml` at the project root.
#[derive(Debug, Deserialize, Default)]
pub struct FlowgraphConfig {
    /// Additional path patterns to exclude from analysis (beyond .gitignore,
    /// dotfiles, and the built-in node_modules/build-output exclusions).
    pub exclude: Option<Vec<String>>,
}

impl FlowgraphConfig {
    /// Load configuration from `flowgraph.toml` in the given root directory.
    ///
    /// Returns a default (empty) configuration if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join("flowgraph.toml");

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("warning: failed to parse flowgraph.toml: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                eprintln!("warning: failed to read flowgraph.toml: {err}. Using defaults.");
                Self::default()
            }
        }
    }
}
