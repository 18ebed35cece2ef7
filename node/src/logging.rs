use color_eyre::eyre::{self, WrapErr};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

const DEFAULT_DIRECTIVES: &str = "ta_indexer=info,ta_index_provisioner=info";

/// Installs the error report hook and the global subscriber.
///
/// Filtering follows `RUST_LOG`. `LOG_FORMAT=json` switches to one JSON object
/// per line, anything else prints for the console. Logs go to stderr so that
/// stdout only carries the report.
pub fn init_logging() -> eyre::Result<()> {
    color_eyre::install()?;

    // Read from `RUST_LOG` environment variable, with fallback to default
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .parse(DEFAULT_DIRECTIVES)
            .wrap_err("Invalid filter directive")?,
    };

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_current_span(false)
            .with_writer(std::io::stderr);
        let subscriber = Registry::default().with(env_filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).wrap_err("Failed to set global default subscriber")?;
    } else {
        let fmt_layer = fmt::layer().with_target(true).with_thread_ids(false).with_writer(std::io::stderr);
        let subscriber = Registry::default().with(env_filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).wrap_err("Failed to set global default subscriber")?;
    }

    Ok(())
}
