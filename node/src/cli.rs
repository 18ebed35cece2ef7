use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use ta_index_provisioner::StoreConfig;

#[derive(Parser, Debug)]
#[command(
    name = "ta-indexer",
    author,
    version,
    about = "Provisions the token analyzer MongoDB indexes",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreParams,

    /// Index layout file (YAML). The built-in token analyzer layout is used when omitted.
    #[arg(env = "TA_INDEX_REGISTRY", long, value_name = "PATH", global = true)]
    pub registry: Option<PathBuf>,

    /// Format of the report printed on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Without a subcommand every collection is provisioned.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Apply(CollectionArgs::default()))
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create every missing index and print the resulting inventory
    Apply(CollectionArgs),
    /// Check that every index exists with the expected specification, without creating anything
    Verify(CollectionArgs),
    /// Print the index layout
    Show,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionArgs {
    /// Restrict the run to these collections. Defaults to all of them.
    #[arg(long = "collection", value_name = "NAME", value_delimiter = ',')]
    pub collections: Vec<String>,
}

/// Parameters used to reach the MongoDB server.
#[derive(Args, Debug, Clone)]
pub struct StoreParams {
    /// The connection string to the MongoDB server.
    #[arg(env = "TA_MONGODB_URI", long, default_value = "mongodb://localhost:27017", global = true)]
    pub mongodb_uri: String,

    /// The name of the database.
    #[arg(env = "TA_DATABASE_NAME", long, default_value = "token_analyzer", global = true)]
    pub database: String,

    /// Connection and server selection timeout (seconds).
    #[arg(env = "TA_MONGODB_TIMEOUT_SECS", long, default_value = "10", global = true)]
    pub mongodb_timeout_secs: u64,
}

impl From<&StoreParams> for StoreConfig {
    fn from(params: &StoreParams) -> Self {
        Self {
            connect_timeout_secs: params.mongodb_timeout_secs,
            server_selection_timeout_secs: params.mongodb_timeout_secs,
            ..StoreConfig::new(params.mongodb_uri.clone(), params.database.clone())
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ta-indexer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_to_apply_on_every_collection() {
        let cli = parse(&[]);
        assert_eq!(cli.command(), Commands::Apply(CollectionArgs::default()));
        assert_eq!(cli.output, OutputFormat::Pretty);
        assert!(cli.registry.is_none());

        let config = StoreConfig::from(&cli.store);
        assert_eq!(config.database_name, "token_analyzer");
        assert_eq!(config.app_name, "ta-indexer");
    }

    #[rstest]
    #[case::comma_separated(&["apply", "--collection", "tokens,alerts"])]
    #[case::repeated(&["apply", "--collection", "tokens", "--collection", "alerts"])]
    fn collection_filter(#[case] args: &[&str]) {
        let Commands::Apply(filter) = parse(args).command() else { panic!("expected apply") };
        assert_eq!(filter.collections, ["tokens", "alerts"]);
    }

    #[test]
    fn global_args_after_subcommand() {
        let cli = parse(&[
            "verify",
            "--mongodb-uri",
            "mongodb://db:27017",
            "--database",
            "analyzer_staging",
            "--output",
            "json",
            "--mongodb-timeout-secs",
            "3",
        ]);
        assert_eq!(cli.command(), Commands::Verify(CollectionArgs::default()));
        assert_eq!(cli.output, OutputFormat::Json);

        let config = StoreConfig::from(&cli.store);
        assert_eq!(config.mongodb_uri, "mongodb://db:27017");
        assert_eq!(config.database_name, "analyzer_staging");
        assert_eq!(config.connect_timeout_secs, 3);
        assert_eq!(config.server_selection_timeout_secs, 3);
    }

    #[test]
    fn rejects_unknown_output() {
        assert!(Cli::try_parse_from(["ta-indexer", "--output", "yaml"]).is_err());
    }
}
