mod cli;
mod commands;
mod embedder;

use anyhow::{Context, Result};
use clap::Parser;

use varscope_core::config::load_dotenv;
use varscope_core::Config;

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }

    match &args.command {
        Command::Select { input } => {
            commands::apply_overrides(&mut config, Some(input), None);
            config.log_summary();
            let selected = commands::selected_variants(&config, &input.events)?;
            commands::run_select(&config, &selected)?;
        }
        Command::Trie { input, top_n } => {
            commands::apply_overrides(&mut config, Some(input), None);
            config.log_summary();
            let selected = commands::selected_variants(&config, &input.events)?;
            commands::run_trie(&config, &selected, top_n.unwrap_or(config.coverage.graph_top_n))?;
        }
        Command::Flow { input, top_n } => {
            commands::apply_overrides(&mut config, Some(input), None);
            config.log_summary();
            let selected = commands::selected_variants(&config, &input.events)?;
            commands::run_flow(&config, &selected, top_n.unwrap_or(config.coverage.graph_top_n))?;
        }
        Command::Hierarchy { input, shape } => {
            commands::apply_overrides(&mut config, Some(input), Some(shape));
            config.log_summary();
            let selected = commands::selected_variants(&config, &input.events)?;
            commands::run_hierarchy(&config, &selected).await?;
        }
        Command::Analyze { csv } => {
            let path = csv.clone().unwrap_or_else(|| config.output.hierarchy_csv());
            commands::run_analyze(&path)?;
        }
        Command::Run { input, shape, rebuild } => {
            commands::apply_overrides(&mut config, Some(input), Some(shape));
            config.log_summary();
            commands::run_pipeline(&config, &input.events, *rebuild).await?;
        }
    }

    Ok(())
}
