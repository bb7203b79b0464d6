use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader};

use pulsegen::{InMemoryTransport, LineSet, LoopOutcome, Supplier, SupplierConfig, Transport};

/// Command-gated synthetic event feed generator.
///
/// Runs the supplier against an in-process transport; lines typed on stdin
/// become control commands ("quit" terminates).
#[derive(Parser, Debug)]
#[command(name = "pulsegen", version)]
struct Cli {
    /// Path to the line-set file
    #[arg(default_value = "./files/test.csv")]
    file: PathBuf,

    /// Full work window in seconds
    #[arg(default_value_t = 120)]
    window_secs: u64,

    /// Publish interval in seconds
    #[arg(default_value_t = 10)]
    interval_secs: u64,

    /// Control queue name
    #[arg(long, default_value = "heatmap-supplier")]
    queue: String,

    /// Broadcast topic name
    #[arg(long, default_value = "heatmap")]
    topic: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "pulsegen=debug,info"
    } else {
        "pulsegen=info"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = SupplierConfig::new(&cli.queue, &cli.topic)
        .lines_file(&cli.file)
        .full_window(Duration::from_secs(cli.window_secs))
        .sleep_interval(Duration::from_secs(cli.interval_secs));
    config.validate().map_err(|err| anyhow::anyhow!(err))?;

    info!("Initializing messaging supplier with the following configuration...");
    info!("Topic: {}", config.topic);
    info!("Control queue: {}", config.control_queue);
    info!("Messages file: {}", config.lines_file.display());
    info!("Work time window (ms): {}", config.full_window.as_millis());
    info!("Sleep interval (ms): {}", config.sleep_interval.as_millis());

    let lines = LineSet::load(&config.lines_file)?;
    info!(
        "Loaded {} line(s) from {}",
        lines.len(),
        config.lines_file.display()
    );

    let transport = Arc::new(InMemoryTransport::new());

    // Stdin injector: every line typed becomes a control command.
    let injector = Arc::clone(&transport);
    let queue = config.control_queue.clone();
    tokio::spawn(async move {
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = input.next_line().await {
            let body = line.trim();
            if body.is_empty() {
                continue;
            }
            if let Err(err) = injector.enqueue(&queue, body, None).await {
                error!("failed to enqueue command: {}", err);
                break;
            }
        }
    });

    let mut supplier = Supplier::new(Arc::clone(&transport), &config, lines);
    match supplier.run().await? {
        LoopOutcome::Terminated => {
            info!(
                "Quitting... published {} message(s) to '{}'",
                transport.publish_count(&config.topic).await,
                config.topic
            );
        }
    }
    Ok(())
}
