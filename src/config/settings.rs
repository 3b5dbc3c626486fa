//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL, or `memory://`)
    pub database: DatabaseSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Real-time gateway configuration
    pub gateway: GatewaySettings,

    /// History paging limits
    pub paging: PagingSettings,

    /// Secret key hashing cost
    pub security: SecuritySettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL; `memory://` selects the in-process store
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations at startup
    pub run_migrations: bool,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Real-time gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Heartbeat interval announced to clients, in milliseconds
    pub heartbeat_interval_ms: u64,

    /// Time allowed for the identify frame, in seconds
    pub identify_timeout_secs: u64,

    /// Outgoing queue length per session; deliveries beyond it are dropped
    pub channel_capacity: usize,

    /// Maximum inbound message size in bytes
    pub max_message_size: usize,
}

/// Message history paging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PagingSettings {
    /// Page size used when the caller gives none
    pub default_take: i64,

    /// Upper bound for any requested page size
    pub max_take: i64,
}

/// Argon2 cost parameters for stored secret keys.
#[derive(Debug, Clone, Deserialize)]
pub struct SecuritySettings {
    /// Memory cost in KiB
    pub hash_memory_kib: u32,

    /// Number of iterations
    pub hash_iterations: u32,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the paging limits are inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    /// Defaults only, with the in-process store. Used by tests and tooling.
    pub fn in_memory() -> Result<Self, ConfigError> {
        Self::builder("test")?
            .set_override("database.url", "memory://")?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "memory://")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("gateway.heartbeat_interval_ms", 45000_i64)?
            .set_default("gateway.identify_timeout_secs", 30_i64)?
            .set_default("gateway.channel_capacity", 256_i64)?
            .set_default("gateway.max_message_size", 65536_i64)?
            .set_default("paging.default_take", 50)?
            .set_default("paging.max_take", 200)?
            // Argon2id defaults recommended by the argon2 crate
            .set_default("security.hash_memory_kib", 19456)?
            .set_default("security.hash_iterations", 2)
    }

    fn validate(settings: Self) -> Result<Self, ConfigError> {
        if settings.paging.default_take <= 0 || settings.paging.max_take < settings.paging.default_take {
            return Err(ConfigError::Message(format!(
                "paging.default_take ({}) must be positive and not exceed paging.max_take ({})",
                settings.paging.default_take, settings.paging.max_take
            )));
        }
        Ok(settings)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseSettings {
    /// Whether the in-process store was selected instead of PostgreSQL.
    pub fn is_memory(&self) -> bool {
        self.url.starts_with("memory://")
    }
}

impl PagingSettings {
    /// Resolve a requested page size against the configured bounds.
    ///
    /// Non-positive sizes are passed through so the caller can reject them.
    pub fn clamp(&self, take: Option<i64>) -> i64 {
        match take {
            None => self.default_take,
            Some(take) => take.min(self.max_take),
        }
    }
}
