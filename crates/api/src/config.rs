use cadence_events::queue::DEFAULT_CAPACITY;

/// Server configuration loaded from environment variables.
///
/// Everything except `CRON_SECRET` has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Bearer token required by the automation endpoints.
    pub cron_secret: String,
    /// Capacity of the automation event queue.
    pub queue_capacity: usize,
    pub scheduler: SchedulerConfig,
}

/// In-process sweep scheduler settings.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                              | Default                 |
    /// |--------------------------------------|-------------------------|
    /// | `HOST`                               | `0.0.0.0`               |
    /// | `PORT`                               | `3000`                  |
    /// | `CORS_ORIGINS`                       | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`               | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`              | `30`                    |
    /// | `CRON_SECRET`                        | required                |
    /// | `AUTOMATION_QUEUE_CAPACITY`          | `1024`                  |
    /// | `AUTOMATION_SCHEDULER_ENABLED`       | `false`                 |
    /// | `AUTOMATION_SCHEDULER_INTERVAL_SECS` | `3600`                  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let cron_secret = std::env::var("CRON_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .expect("CRON_SECRET must be set");

        let queue_capacity: usize = std::env::var("AUTOMATION_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_CAPACITY);

        let scheduler = SchedulerConfig {
            enabled: std::env::var("AUTOMATION_SCHEDULER_ENABLED")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
            interval_secs: std::env::var("AUTOMATION_SCHEDULER_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".into())
                .parse()
                .expect("AUTOMATION_SCHEDULER_INTERVAL_SECS must be a valid u64"),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            cron_secret,
            queue_capacity,
            scheduler,
        }
    }
}
