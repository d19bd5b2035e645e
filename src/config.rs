use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub gateway: GatewayConfig,

    #[command(flatten)]
    pub devotional: DevotionalConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "STEEPLE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "STEEPLE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Per-request timeout for the HTTP relay
    #[arg(long, env = "STEEPLE_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// How long to wait for background tasks on shutdown
    #[arg(long, env = "STEEPLE_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long, env = "STEEPLE_DATABASE_URL")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "STEEPLE_DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Minimum number of pooled connections kept warm
    #[arg(long, env = "STEEPLE_DB_MIN_CONNECTIONS", default_value_t = 1)]
    pub min_connections: u32,

    /// Timeout when acquiring a connection from the pool
    #[arg(long, env = "STEEPLE_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct GatewayConfig {
    /// Push gateway endpoint accepting message batches
    #[arg(long, env = "STEEPLE_GATEWAY_URL", default_value = "https://exp.host/--/api/v2/push/send")]
    pub url: String,

    /// Maximum messages per batch (the gateway rejects larger submissions)
    #[arg(long, env = "STEEPLE_GATEWAY_BATCH_SIZE", default_value_t = 100)]
    pub batch_size: usize,

    /// Timeout for one batch submission
    #[arg(long, env = "STEEPLE_GATEWAY_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct DevotionalConfig {
    /// Hour of day (0-23, congregation local time) to send the devotional
    #[arg(long, env = "STEEPLE_DEVOTIONAL_HOUR", default_value_t = 7)]
    pub send_hour: u8,

    /// Minute of the hour to send the devotional
    #[arg(long, env = "STEEPLE_DEVOTIONAL_MINUTE", default_value_t = 0)]
    pub send_minute: u8,

    /// Fixed UTC offset in hours of the congregation's local time
    #[arg(long, env = "STEEPLE_DEVOTIONAL_UTC_OFFSET", default_value_t = 0, allow_hyphen_values = true)]
    pub utc_offset_hours: i8,

    /// Users fetched per page while scanning the population
    #[arg(long, env = "STEEPLE_DEVOTIONAL_PAGE_SIZE", default_value_t = 500)]
    pub page_size: i64,

    /// Preference flag gating the devotional send
    #[arg(long, env = "STEEPLE_DEVOTIONAL_CATEGORY", default_value = "devotionals")]
    pub category: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP endpoint for traces and metrics; telemetry export is disabled when unset
    #[arg(long, env = "STEEPLE_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "STEEPLE_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
