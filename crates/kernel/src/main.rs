//! Data Cloud Kernel
//!
//! Command-line front end: authorizes an AppLink connection, runs one query
//! and prints the response envelope as JSON on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use datacloud_kernel::query::{
    ENGAGEMENT_QUERY_NAME, FilterSet, QueryRegistry, UNIFIED_B2B_QUERY_NAME,
};
use datacloud_kernel::{AppLinkClient, Config, QueryExecutionService, QueryOutcome};

#[derive(Debug, Parser)]
#[command(
    name = "datacloud",
    version,
    about = "Query Salesforce Data Cloud through Heroku AppLink"
)]
struct Cli {
    /// AppLink connection to authorize (overrides APPLINK_CONNECTION_NAME).
    #[arg(long, global = true)]
    connection: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the names of the built-in queries.
    Queries,
    #[command(flatten)]
    Run(RunCommand),
}

/// Commands that need an authorized connection.
#[derive(Debug, Subcommand)]
enum RunCommand {
    /// Unified B2B accounts.
    UnifiedB2b {
        /// Substring match on account name.
        #[arg(long)]
        account_name: Option<String>,
        /// Exact match on account source.
        #[arg(long)]
        account_source: Option<String>,
        /// Exact match on account type (segment).
        #[arg(long)]
        segment: Option<String>,
    },
    /// Recent website engagement events.
    Engagement,
    /// Run literal SQL; rows are returned as positional arrays.
    Raw {
        sql: String,
    },
    /// List Data Cloud data model objects.
    Models {
        #[arg(long)]
        entity_category: Option<String>,
        #[arg(long)]
        entity_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let registry = QueryRegistry::builtin();

    let command = match cli.command {
        Command::Queries => {
            for name in registry.names() {
                println!("{name}");
            }
            return Ok(());
        }
        Command::Run(command) => command,
    };

    let config = Config::from_env().context("failed to load configuration")?;
    let client = AppLinkClient::from_config(&config).context("failed to build HTTP client")?;
    let connection = cli
        .connection
        .unwrap_or_else(|| config.connection_name.clone());

    let service = QueryExecutionService::new(Arc::new(client), connection);
    info!(
        request_id = %service.request_id(),
        connection = %service.connection_name(),
        "Service ready"
    );

    let outcome = match command {
        RunCommand::UnifiedB2b {
            account_name,
            account_source,
            segment,
        } => {
            let filters = filter_set([
                ("accountName", account_name),
                ("accountSource", account_source),
                ("segment", segment),
            ]);
            run_builtin(&service, &registry, UNIFIED_B2B_QUERY_NAME, &filters).await?
        }
        RunCommand::Engagement => {
            run_builtin(&service, &registry, ENGAGEMENT_QUERY_NAME, &FilterSet::new()).await?
        }
        RunCommand::Raw { sql } => service
            .execute_raw_query(&sql)
            .await
            .context("Data Cloud authorization failed")?,
        RunCommand::Models {
            entity_category,
            entity_name,
        } => {
            let params = filter_set([
                ("entityCategory", entity_category),
                ("entityName", entity_name),
            ]);
            service
                .list_data_models(&params)
                .await
                .context("Data Cloud authorization failed")?
        }
    };

    let body = serde_json::to_string_pretty(&outcome).context("failed to serialize response")?;
    println!("{body}");

    Ok(())
}

/// Run a built-in query looked up by name.
async fn run_builtin(
    service: &QueryExecutionService,
    registry: &QueryRegistry,
    name: &str,
    filters: &FilterSet,
) -> Result<QueryOutcome> {
    let definition = registry
        .get(name)
        .with_context(|| format!("unknown query `{name}`"))?;

    service
        .execute_query_with_filters(definition, filters)
        .await
        .context("Data Cloud authorization failed")
}

/// Collect the flags that were given; omitted flags never enter the set.
fn filter_set<const N: usize>(entries: [(&str, Option<String>); N]) -> FilterSet {
    entries
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), Value::String(v))))
        .collect()
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn"));

    // stdout carries the JSON envelope, so logs go to stderr.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
