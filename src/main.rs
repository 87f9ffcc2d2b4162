use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use orders_etl::config::Settings;
use orders_etl::consumer::OrdersConsumer;
use orders_etl::error::EtlError;
use orders_etl::storage::{OrderStore, SqliteStore};
use orders_etl::transport::{FileQueue, Transport};
use orders_etl::{logging, metrics, producer, server};

/// Offset-tracking name under which the ingestion worker consumes the queue.
const CONSUMER_NAME: &str = "orders";

#[derive(Parser)]
#[command(name = "orders_etl")]
#[command(about = "Order ingestion ETL: normalize, auto-fix, validate, route")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (CSV upload + order listings)
    Serve {
        /// Port override; defaults to HTTP_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the order ingestion worker
    Consumer,
    /// Publish a CSV file to the orders queue
    Publish {
        /// Source tag for the published rows
        #[arg(long, default_value = "online")]
        source: String,
        /// CSV file with a header row
        #[arg(long)]
        file: PathBuf,
    },
}

fn open_store(settings: &Settings) -> Result<Arc<dyn OrderStore>, EtlError> {
    let store = SqliteStore::open(&settings.database_path)?;
    if settings.migrate_on_start {
        store.migrate()?;
        info!("order sink tables ensured on startup");
    }
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();
    let settings = Settings::from_env();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            metrics::init_metrics();
            let store = open_store(&settings)?;
            let transport: Arc<dyn Transport> =
                Arc::new(FileQueue::open(settings.queue_root(), CONSUMER_NAME)?);
            server::start_server(store, transport, port.unwrap_or(settings.http_port)).await?;
        }
        Commands::Consumer => {
            metrics::init_metrics();
            let store = open_store(&settings)?;
            let transport: Arc<dyn Transport> =
                Arc::new(FileQueue::open(settings.queue_root(), CONSUMER_NAME)?);
            let consumer = OrdersConsumer::new(transport, store);
            consumer.run().await?;
        }
        Commands::Publish { source, file } => {
            let transport = FileQueue::open(settings.queue_root(), CONSUMER_NAME)?;
            let published = producer::publish_csv(&transport, &source, &file).await?;
            println!("published {published} rows from {}", file.display());
        }
    }
    Ok(())
}
