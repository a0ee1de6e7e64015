//! glance-cql - run CQL scripts and browse Cassandra/ScyllaDB schemas.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use glance_cql::catalog::{CatalogEntry, Table};
use glance_cql::cli::{self, Cli, Command};
use glance_cql::config::{Config, ConnectionConfig};
use glance_cql::db::{Connector, MockSession, QueryResult, ScyllaConnector};
use glance_cql::driver::CqlDriver;
use glance_cql::error::{GlanceError, Result};
use glance_cql::logging;
use glance_cql::output::{self, OutputFormat};
use glance_cql::query::ExecuteOptions;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            match e.downcast_ref::<GlanceError>() {
                Some(ge) => error!("{}: {}", ge.category(), ge),
                None => error!("{e:#}"),
            }
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Runs the selected command. Returns false when a statement failed.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connector: Arc<dyn Connector> = if cli.mock_db {
        info!("Using mock database");
        Arc::new(MockSession::demo())
    } else {
        Arc::new(ScyllaConnector)
    };

    let connection = match resolve_connection(&cli, &config)? {
        Some(conn) => conn,
        None if cli.mock_db => ConnectionConfig::default(),
        None => {
            warn!("No cluster connection configured");
            anyhow::bail!(GlanceError::config(
                "No cluster connection configured. Use --url, --host or a config file."
            ));
        }
    };
    info!("Connection: {}", connection.display_string());

    let driver = CqlDriver::new(connection, connector, &config.query);
    let format = cli.output_format();
    let outcome = dispatch(&cli, &driver, format).await;

    if let Err(e) = driver.close().await {
        warn!(error = %e, "Failed to close connection");
    }
    outcome
}

async fn dispatch(cli: &Cli, driver: &CqlDriver, format: OutputFormat) -> anyhow::Result<bool> {
    match &cli.command {
        Command::Run {
            file,
            execute,
            request_id,
        } => {
            let script = match (file, execute) {
                (Some(path), _) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read script {}", path.display()))?,
                (None, Some(text)) => text.clone(),
                (None, None) => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read script from stdin")?;
                    buf
                }
            };
            let options = ExecuteOptions {
                request_id: request_id.clone(),
            };
            let results = driver.run_script(&script, &options).await?;
            Ok(print_results(&results, format))
        }
        Command::Keyspaces => {
            let entries = driver
                .list_keyspaces()
                .await?
                .into_iter()
                .map(CatalogEntry::Keyspace)
                .collect::<Vec<_>>();
            println!("{}", output::format_entries(&entries, format));
            Ok(true)
        }
        Command::Tables { .. } => {
            let entries = driver
                .list_tables(cli.keyspace_filter().as_ref())
                .await?
                .into_iter()
                .map(CatalogEntry::Table)
                .collect::<Vec<_>>();
            println!("{}", output::format_entries(&entries, format));
            Ok(true)
        }
        Command::Columns { table } => {
            let parent = table.as_deref().map(column_parent);
            let entries = driver
                .list_columns(parent.as_ref())
                .await?
                .into_iter()
                .map(CatalogEntry::Column)
                .collect::<Vec<_>>();
            println!("{}", output::format_entries(&entries, format));
            Ok(true)
        }
        Command::Describe { table } => {
            let table = cli::parse_table(table)?;
            let results = driver
                .describe_table(&table, &ExecuteOptions::default())
                .await?;
            Ok(print_results(&results, format))
        }
        Command::Preview { table, .. } => {
            let table = cli::parse_table(table)?;
            let request = cli.page_request().unwrap_or_default();
            let results = driver
                .show_records(&table, request, &ExecuteOptions::default())
                .await?;
            Ok(print_results(&results, format))
        }
        Command::Test => {
            let dialect = driver.test_connection().await?;
            println!(
                "Connection to {} ok ({} schema)",
                driver.connection_id(),
                dialect.dialect()
            );
            Ok(true)
        }
    }
}

/// Columns are filtered by table name, so a bare name is accepted too.
fn column_parent(arg: &str) -> Table {
    Table::parse_qualified(arg).unwrap_or_else(|| Table::new("", arg))
}

fn print_results(results: &[QueryResult], format: OutputFormat) -> bool {
    println!("{}", output::format_results(results, format));
    results.iter().all(|r| !r.is_error)
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    let from_cli = cli.to_connection_config()?;

    // Precedence:
    // 1. CLI arguments (highest)
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. Environment variables
    let mut connection = match cli.connection_name() {
        Some(name) => {
            let mut named = config.get_connection(Some(name)).cloned().ok_or_else(|| {
                GlanceError::config(format!("Connection '{}' not found in config file", name))
            })?;
            if let Some(overrides) = &from_cli {
                named.merge(overrides);
            }
            Some(named)
        }
        None => from_cli,
    };

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}
