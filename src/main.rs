use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sqm_lowering::config::{CliConfig, LoweringConfig};
use sqm_lowering::domain_metamodel::MetamodelConfig;
use sqm_lowering::lower_with_config;
use sqm_lowering::sqm::SqmStatement;

/// sqm-lower - lowers an SQM statement against a domain metamodel and prints
/// the SQL AST with its from-element index as JSON
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Metamodel definition (YAML)
    #[arg(long)]
    metamodel: PathBuf,

    /// SQM statement (JSON)
    #[arg(long)]
    statement: PathBuf,

    /// Lowering configuration (YAML); the fields it sets override environment variables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prefix of generated alias bases
    #[arg(long)]
    alias_prefix: Option<String>,

    /// Print compact instead of pretty JSON
    #[arg(long)]
    compact: bool,
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        CliConfig {
            alias_prefix: cli.alias_prefix.clone(),
            expand_all_subclass_tables: None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env when present; missing files are fine
    dotenvy::dotenv().ok();

    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = LoweringConfig::load(cli.config.as_deref(), &CliConfig::from(&cli))
        .context("Configuration error")?;

    let metamodel = MetamodelConfig::from_yaml_file(&cli.metamodel)
        .and_then(|definition| definition.build_metamodel())
        .with_context(|| format!("Failed to build metamodel from {}", cli.metamodel.display()))?;
    log::info!(
        "Loaded metamodel with {} entities from {}",
        metamodel.entity_names().count(),
        cli.metamodel.display()
    );

    let statement_json = fs::read_to_string(&cli.statement)
        .with_context(|| format!("Failed to read statement {}", cli.statement.display()))?;
    let statement: SqmStatement =
        serde_json::from_str(&statement_json).context("Statement is not a valid SQM document")?;

    let (tree, from_index) = lower_with_config(&statement, &metamodel, &config)?;

    let output = serde_json::json!({
        "sql_ast": tree,
        "from_index": from_index,
    });
    let rendered = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);
    Ok(())
}
