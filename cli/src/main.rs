//! village: entry point for running VillageSquare deployments.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use village_deploy::{DeployConfig, DeployEnv, DeployGraph, DeploymentRecord, RunReport};
use village_types::NetworkId;
use village_utils::LogFormat;

#[derive(Parser)]
#[command(name = "village", about = "VillageSquare DAO deployment tool")]
struct Cli {
    /// Network: "hardhat", "localhost", "mumbai" or "polygon".
    /// When a config file is provided, defaults to the file's network value.
    #[arg(long, global = true, env = "VILLAGE_NETWORK")]
    network: Option<NetworkId>,

    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "VILLAGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit JSON logs and JSON output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the deployment steps selected by tag.
    Deploy {
        /// Comma-separated tags, e.g. "villagesquare,setup".
        #[arg(long, value_delimiter = ',', default_value = "all")]
        tags: Vec<String>,
    },
    /// Print the ordered steps for the tags without running them.
    Plan {
        #[arg(long, value_delimiter = ',', default_value = "all")]
        tags: Vec<String>,
    },
    /// Print the effective configuration as TOML (secrets omitted).
    Config,
}

#[derive(Serialize)]
struct DeployOutput<'a> {
    network: NetworkId,
    report: &'a RunReport,
    deployments: Vec<&'a DeploymentRecord>,
}

fn load_config(cli: &Cli) -> anyhow::Result<DeployConfig> {
    let mut config = match &cli.config {
        Some(path) => DeployConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DeployConfig::default(),
    };
    config.apply_env().context("reading environment overrides")?;
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if cli.json {
        config.log_format = "json".to_string();
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let format = if config.log_format == "json" {
        LogFormat::Json
    } else {
        LogFormat::Human
    };
    village_utils::init_logging(format, &config.log_level);

    let graph = DeployGraph::standard();
    match &cli.command {
        Command::Plan { tags } => {
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            let plan = graph.plan(&tags)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                for (i, step) in plan.iter().enumerate() {
                    println!("{:>2}. {step}", i + 1);
                }
            }
        }
        Command::Deploy { tags } => {
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            let network = config.network;
            let min_delay = config.min_delay;
            let mut env = DeployEnv::new(config)?;
            let report = graph.run(&mut env, &tags)?;
            tracing::info!(
                applied = report.applied.len(),
                skipped = report.skipped.len(),
                "deployment finished"
            );

            if cli.json {
                let output = DeployOutput {
                    network,
                    report: &report,
                    deployments: env.deployments.iter().collect(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("network: {network}");
                println!("timelock delay: {}", village_utils::format_duration(min_delay));
                for record in env.deployments.iter() {
                    println!("{:<16} {} (block {})", record.name, record.address, record.block);
                }
            }
        }
        Command::Config => print!("{}", config.to_toml_string()),
    }
    Ok(())
}
