//! dbt-select: evaluate dbt selection expressions against a model graph snapshot.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dbt_selector::{LeadingExclusion, ModelGraph, ModelNode, ModelSelector, SelectorConfig};

#[derive(Parser)]
#[command(name = "dbt-select")]
#[command(about = "Resolve dbt model selectors against a project graph")]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the models an expression selects
    #[command(visible_alias = "ls")]
    List {
        /// JSON graph snapshot: an array of models or {"models": [...]}
        #[arg(short = 'g', long = "graph", env = "DBT_SELECT_GRAPH")]
        graph: PathBuf,

        /// Selection expression (e.g. 'tag:marketing,+downstream_model')
        #[arg(short = 's', long = "select", default_value = "*")]
        select: String,

        /// Models to drop from the selection afterwards
        #[arg(short = 'e', long = "exclude")]
        exclude: Option<String>,

        /// Cap for '+' / '@' expansions without an explicit depth
        #[arg(long = "max-depth")]
        max_depth: Option<usize>,

        /// Treat a leading '!' as subtracting from nothing instead of from all models
        #[arg(long = "strict-exclusion")]
        strict_exclusion: bool,

        /// Print identifiers as a JSON array
        #[arg(long = "json")]
        json: bool,
    },

    /// Show how an expression is parsed
    Parse {
        /// Selection expression
        expression: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli.command) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::List { graph, select, exclude, max_depth, strict_exclusion, json } => {
            let graph = ModelGraph::from_path(&graph)
                .with_context(|| format!("loading graph from {}", graph.display()))?;
            tracing::info!(models = graph.len(), edges = graph.edge_count(), "loaded model graph");

            let mut config = SelectorConfig::default();
            if let Some(depth) = max_depth {
                config = config.with_max_depth(depth);
            }
            if strict_exclusion {
                config = config.with_leading_exclusion(LeadingExclusion::FromEmpty);
            }

            let selector = ModelSelector::new(&graph).with_config(config);
            let selection = match &exclude {
                Some(exclude) => selector.selection_excluding(&select, exclude),
                None => selector.selection(&select),
            }
            .with_context(|| format!("evaluating selector '{select}'"))?;

            let models = selection.models(&graph);
            let mut out = io::stdout().lock();
            if json {
                write_json(&mut out, &models)?;
            } else {
                write_listing(&mut out, &select, &models)?;
            }
        }

        Commands::Parse { expression } => {
            let expr = dbt_selector::parse(&expression)?;
            tracing::debug!(canonical = %expr, "parsed expression");
            println!("{}", serde_json::to_string_pretty(&expr)?);
        }
    }

    Ok(())
}

fn write_json(out: &mut impl Write, models: &[&ModelNode]) -> anyhow::Result<()> {
    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    serde_json::to_writer_pretty(&mut *out, &names)?;
    writeln!(out)?;
    Ok(())
}

fn write_listing(out: &mut impl Write, select: &str, models: &[&ModelNode]) -> io::Result<()> {
    if models.is_empty() {
        return writeln!(out, "No models selected using '{select}'");
    }

    writeln!(out, "Selected {} model(s) using '{select}':", models.len())?;
    for (i, model) in models.iter().enumerate() {
        let schema = model.schema.as_deref().unwrap_or("-");
        writeln!(out, "{}. {} ({}, {})", i + 1, model.name, model.materialization, schema)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbt_selector::Materialization;

    fn render(select: &str, models: &[&ModelNode]) -> String {
        let mut out = Vec::new();
        write_listing(&mut out, select, models).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_listing() {
        let stg = ModelNode::new("stg_orders").with_schema("staging");
        let fct = ModelNode::new("fct_orders").with_materialization(Materialization::Incremental);

        assert_eq!(
            render("+stg_orders", &[&stg, &fct]),
            "Selected 2 model(s) using '+stg_orders':\n\
             1. stg_orders (view, staging)\n\
             2. fct_orders (incremental, -)\n"
        );
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(render("tag:none", &[]), "No models selected using 'tag:none'\n");
    }

    #[test]
    fn test_json_listing() {
        let a = ModelNode::new("a");
        let b = ModelNode::new("b");
        let mut out = Vec::new();
        write_json(&mut out, &[&b, &a]).unwrap();
        let names: Vec<String> = serde_json::from_slice(&out).unwrap();
        assert_eq!(names, vec!["b", "a"]);
    }
}
