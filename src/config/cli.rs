use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Tablero binary.
#[derive(Debug, Parser)]
#[command(name = "tablero", version, about = "Tablero admin dashboard API")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TABLERO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(Box<ServeArgs>),
    /// Print the resolved settings and exit.
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the cache driver name (memory, array, redis, memcached, file, ...).
    #[arg(long = "cache-driver", value_name = "NAME")]
    pub cache_driver: Option<String>,

    /// Override the cache entry lifetime.
    #[arg(long = "cache-ttl", value_name = "SECONDS")]
    pub cache_ttl: Option<u64>,

    /// Override the maximum number of cached entries.
    #[arg(long = "cache-capacity", value_name = "COUNT")]
    pub cache_capacity: Option<u64>,

    /// Override the page size used when a request sends none.
    #[arg(long = "per-page-default", value_name = "COUNT")]
    pub per_page_default: Option<u32>,

    /// Override the smallest accepted page size.
    #[arg(long = "per-page-min", value_name = "COUNT")]
    pub per_page_min: Option<u32>,

    /// Override the largest accepted page size.
    #[arg(long = "per-page-max", value_name = "COUNT")]
    pub per_page_max: Option<u32>,

    /// Override the JSON file the catalog is seeded from.
    #[arg(long = "catalog-seed-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub catalog_seed_file: Option<PathBuf>,
}
