//! cost-tracker - Lambda entrypoint and local invoker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use tracing::info;

use cost_tracker::telemetry::init_tracing;
use cost_tracker::{Config, CostExplorerClient, Dispatcher, DynamoDbStore, HttpResponse, SystemClock};

/// Log yesterday's AWS spend on a schedule and serve the log over HTTP.
#[derive(Parser)]
#[command(name = "cost-tracker")]
#[command(about = "Daily AWS cost logger and log reader")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Lambda runtime loop (default)
    Lambda,

    /// Handle a single invocation locally and print the response
    Invoke {
        /// JSON payload file; `{}` (a scheduled invocation) when omitted
        #[arg(long)]
        event: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format, cli.verbose);

    let store = Arc::new(DynamoDbStore::new(&config).context("Failed to create DynamoDB store")?);
    let costs =
        Arc::new(CostExplorerClient::new(&config).context("Failed to create Cost Explorer client")?);
    let dispatcher = Dispatcher::new(costs, store, Arc::new(SystemClock));

    info!(table = %config.table_name, region = %config.region, "cost-tracker initialized");

    match cli.command.unwrap_or(Commands::Lambda) {
        Commands::Lambda => run_lambda(&dispatcher).await,
        Commands::Invoke { event } => invoke_once(&dispatcher, event).await,
    }
}

async fn run_lambda(dispatcher: &Dispatcher) -> Result<()> {
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let (payload, context) = event.into_parts();
        info!(request_id = %context.request_id, "Invocation received");
        let response: HttpResponse = dispatcher.handle(&payload).await?;
        Ok::<_, lambda_runtime::Error>(response)
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
    .context("Lambda runtime exited")
}

async fn invoke_once(dispatcher: &Dispatcher, event: Option<PathBuf>) -> Result<()> {
    let payload: Value = match event {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {} as JSON", path.display()))?
        }
        None => Value::Object(serde_json::Map::new()),
    };

    let response = dispatcher.handle(&payload).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
