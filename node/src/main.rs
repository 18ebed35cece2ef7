//! Token analyzer index provisioning.
//!
//! Connects to the analyzer's MongoDB database, creates the indexes every
//! analyzer service relies on and prints the resulting per-collection
//! inventory. Safe to run on every deployment: converged indexes are left
//! untouched.

mod cli;
mod logging;

use clap::Parser as _;
use cli::{Cli, CollectionArgs, Commands, OutputFormat};
use color_eyre::eyre::{self, WrapErr};
use dotenvy::dotenv;
use ta_index_provisioner::mongodb::MongoStore;
use ta_index_provisioner::{ProvisionReport, Provisioner, StoreConfig};
use ta_index_spec::{Collection, Registry};
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    logging::init_logging()?;
    let cli = Cli::parse();

    let registry = match &cli.registry {
        Some(path) => Registry::from_yaml_file(path)?,
        None => Registry::token_analyzer(),
    };
    info!(layout = registry.version(), indexes = registry.len(), "Index layout loaded");

    match cli.command() {
        Commands::Apply(args) => {
            let store = connect(&cli).await?;
            let provisioner = Provisioner::new(&registry, &store);
            let collections = select_collections(&provisioner, &registry, &args)?;
            let report = provisioner.provision_collections(&collections).await?;
            print_report(&cli, &report)?;
        }
        Commands::Verify(args) => {
            let store = connect(&cli).await?;
            let provisioner = Provisioner::new(&registry, &store);
            let collections = select_collections(&provisioner, &registry, &args)?;
            let report = provisioner.verify_collections(&collections).await?;
            print_report(&cli, &report)?;
        }
        Commands::Show => print_registry(cli.output, &registry)?,
    }

    Ok(())
}

async fn connect(cli: &Cli) -> eyre::Result<MongoStore> {
    let config = StoreConfig::from(&cli.store);
    info!(uri = %config.redacted_uri(), database = %config.database_name, "Connecting to MongoDB");
    MongoStore::connect(&config).await.wrap_err_with(|| format!("Failed to connect to {}", config.redacted_uri()))
}

fn select_collections(
    provisioner: &Provisioner<'_, MongoStore>,
    registry: &Registry,
    args: &CollectionArgs,
) -> eyre::Result<Vec<Collection>> {
    if args.collections.is_empty() {
        return Ok(registry.all_collections().to_vec());
    }
    Ok(provisioner.resolve_collections(args.collections.as_slice())?)
}

#[allow(clippy::print_stdout)]
fn print_report(cli: &Cli, report: &ProvisionReport) -> eyre::Result<()> {
    match cli.output {
        OutputFormat::Pretty => {
            println!("Database: {}", cli.store.database);
            println!("{report}");
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_registry(output: OutputFormat, registry: &Registry) -> eyre::Result<()> {
    match output {
        OutputFormat::Pretty => print!("{}", registry.to_yaml_string()?),
        OutputFormat::Json => {
            let definitions: Vec<_> = registry.iter().collect();
            println!("{}", serde_json::to_string_pretty(&definitions)?);
        }
    }
    Ok(())
}
