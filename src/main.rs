mod analysis;
mod cli;
mod config;
mod export;
mod graph;
mod parser;
mod resolver;
mod routes;
mod walker;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use cli::{Cli, Commands};
use config::FlowgraphConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Graph { path, pretty } => {
            let config = FlowgraphConfig::load(&path);
            let graph = analysis::analyze_project(&path, &config)?;
            print_json(&graph, pretty)?;
        }
        Commands::Routes { file, pretty } => {
            let routes = routes::infer_routes(&file)?;
            print_json(&routes, pretty)?;
        }
        Commands::Symbols { file, pretty } => {
            let graph = analysis::analyze_file(&file)?;
            print_json(&graph, pretty)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
