use clap::{Parser, ValueEnum};
use std::time::Duration;

// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "guide-relay")]
#[command(about = "Streaming relay, reload broadcaster and guide cache for a text-generation backend")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "GUIDE_RELAY_PORT", default_value_t = 8001)]
    pub port: u16,

    // Address to bind
    #[arg(long, env = "GUIDE_RELAY_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    // Default generation backend, used when a request carries no override header
    // Example: "localhost:11434" or "http://10.0.0.5:11434"
    #[arg(short, long, env = "GUIDE_RELAY_UPSTREAM", default_value = "http://localhost:11434")]
    pub upstream: String,

    // SQLite database holding cached guides
    #[arg(short, long, env = "GUIDE_RELAY_DATABASE_URL", default_value = "sqlite://task_cache.db")]
    pub database_url: String,

    // Cache pool size
    #[arg(long, env = "GUIDE_RELAY_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    // Seconds to wait for the upstream to start responding
    #[arg(long, env = "GUIDE_RELAY_CONNECT_TIMEOUT", default_value_t = 30)]
    pub connect_timeout: u64,

    // Seconds between keepalive comments on idle event streams
    #[arg(long, env = "GUIDE_RELAY_KEEPALIVE_INTERVAL", default_value_t = 15)]
    pub keepalive_interval: u64,

    #[arg(long, env = "GUIDE_RELAY_LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,

    #[arg(long, env = "GUIDE_RELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
