use std::env;
use std::path::PathBuf;

/// Process settings, built once at startup and passed into each component.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory for the durable delivery queue.
    pub queue_dir: PathBuf,
    /// Name of the orders queue (one delivery log per queue).
    pub queue_name: String,
    /// Path to the SQLite database holding the three order sinks.
    pub database_path: PathBuf,
    /// Port for the HTTP API.
    pub http_port: u16,
    /// Whether to create the sink tables on startup.
    pub migrate_on_start: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            queue_dir: PathBuf::from(env_or("QUEUE_DIR", "data/queue")),
            queue_name: env_or("ORDERS_QUEUE", "orders_raw"),
            database_path: PathBuf::from(env_or("DATABASE_PATH", "data/orders.db")),
            http_port: env::var("HTTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            migrate_on_start: parse_bool(&env_or("MIGRATE_ON_START", "true")),
        }
    }

    /// Directory holding the delivery log and offset metadata for the queue.
    pub fn queue_root(&self) -> PathBuf {
        self.queue_dir.join(&self.queue_name)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
