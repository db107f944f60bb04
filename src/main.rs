use std::sync::Arc;

use docstore_processor::metrics::encode_metrics;
use docstore_processor::metrics::register_custom_metrics;
use docstore_processor::metrics::REGISTRY;
use docstore_processor::DocstoreConfig;
use docstore_processor::DocumentProcessor;
use docstore_processor::MemoryCluster;
use docstore_processor::Message;
use docstore_processor::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let config = DocstoreConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability();
    if let Err(e) = register_custom_metrics(&REGISTRY) {
        error!("Failed to register metrics: {:?}", e);
    }
    info!("Loaded config: {:?}", config);

    let cluster = Arc::new(MemoryCluster::connect(&config.connection)?);
    let processor = DocumentProcessor::new(&config, cluster).await?;

    // Initializing Shutdown Signal
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown(token).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let run_result = run(&processor, config.processor.batch_size, &shutdown).await;
    if let Err(e) = &run_result {
        error!("processor stops: {:?}", e);
    }

    processor.close().await?;
    debug!("{}", encode_metrics(&REGISTRY));

    println!("Exiting program.");
    run_result
}

/// Reads newline-delimited messages from stdin and writes processed bodies to stdout.
async fn run(
    processor: &DocumentProcessor,
    batch_size: usize,
    shutdown: &CancellationToken,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut batch: Vec<Message> = Vec::with_capacity(batch_size);

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown while reading, dropping {} pending messages", batch.len());
                return Ok(());
            },
            line = lines.next_line() => line?,
        };

        let eof = line.is_none();
        if let Some(line) = line {
            batch.push(Message::new(line));
        }

        if batch.len() >= batch_size || (eof && !batch.is_empty()) {
            processor.process_batch(&mut batch, shutdown).await?;
            for message in batch.drain(..) {
                let out = match message.error() {
                    Some(e) => format!("error: {e}\n"),
                    None => format!("{}\n", String::from_utf8_lossy(message.body())),
                };
                stdout.write_all(out.as_bytes()).await?;
            }
            stdout.flush().await?;
        }

        if eof {
            return Ok(());
        }
    }
}

async fn graceful_shutdown(shutdown: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }

    shutdown.cancel();
    info!("Shutdown requested");
    Ok(())
}

pub fn init_observability() -> WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    guard
}
