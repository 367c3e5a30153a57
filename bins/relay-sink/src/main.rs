mod stdout;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use relay_api::dispatch::Dispatcher;
use relay_api::record::SinkRecord;
use relay_engine::error::EngineError;
use relay_engine::task::SinkTask;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::stdout::StdoutDispatcher;

#[derive(Parser)]
#[command(name = "relay-sink", about = "Relay JSON-line records to addressed agents")]
struct Cli {
    /// Path to TOML file with a [properties] table.
    #[arg(long, default_value = "relay.toml", env = "RELAY_CONFIG")]
    config: PathBuf,

    /// File with one JSON record per line. Reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Records per batch handed to the task.
    #[arg(long, default_value_t = 100, env = "RELAY_BATCH_SIZE")]
    batch_size: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "relay-sink failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), EngineError> {
    tracing::info!(config = %cli.config.display(), "loading properties");
    let props = relay_engine::config::load_properties(&cli.config)?;
    let task = Arc::new(SinkTask::start(&props, StdoutDispatcher)?);
    tracing::info!(version = task.version(), "relay-sink started, press Ctrl+C to stop");

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let mut lines = reader.lines();
    let batch_size = cli.batch_size.max(1);
    let mut batch: Vec<SinkRecord> = Vec::with_capacity(batch_size);
    let mut line_no = 0usize;
    let mut relayed = 0usize;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                let record = relay_engine::envelope::decode_line(&line)
                    .map_err(|e| e.with_context(format!("line {line_no}")))?;
                batch.push(record);
                if batch.len() >= batch_size {
                    let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                    relayed += relay(&task, full).await?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down...");
                break;
            }
        }
    }

    if !batch.is_empty() {
        relayed += relay(&task, batch).await?;
    }
    tracing::info!(records = relayed, "input drained");
    if let Ok(task) = Arc::try_unwrap(task) {
        task.stop();
    }
    Ok(())
}

/// Hand one batch to the task on the blocking pool; dispatch is synchronous.
async fn relay<D>(task: &Arc<SinkTask<D>>, batch: Vec<SinkRecord>) -> Result<usize, EngineError>
where
    D: Dispatcher + 'static,
{
    let task = Arc::clone(task);
    tokio::task::spawn_blocking(move || task.put(&batch))
        .await
        .map_err(std::io::Error::from)?
}
