use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sink: SinkConfig,
    pub database: DatabaseConfig,
    pub lock: LockConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Dialect name or alias, resolved through the sink registry
    pub dialect: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockConfig {
    pub table: String,
    pub database: Option<String>,
    pub group: Option<String>,
    pub batch_id_seed: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Try to load from .env file
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder()
            .set_default("sink.dialect", "sqlite")?
            .set_default("database.url", "sqlite::memory:")?
            .set_default("lock.table", "batch_lock")?
            .set_default("logging.level", "info")?;

        if let Ok(dialect) = env::var("PERSISTENCE_DIALECT") {
            builder = builder.set_override("sink.dialect", dialect)?;
        }

        if let Ok(database_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url)?;
        }

        if let Ok(table) = env::var("LOCK_TABLE") {
            builder = builder.set_override("lock.table", table)?;
        }

        if let Ok(database) = env::var("LOCK_DATABASE") {
            builder = builder.set_override("lock.database", Some(database))?;
        }

        if let Ok(group) = env::var("LOCK_GROUP") {
            builder = builder.set_override("lock.group", Some(group))?;
        }

        if let Ok(seed) = env::var("LOCK_BATCH_ID_SEED") {
            let seed = seed.trim().parse::<i64>().map_err(|e| {
                config::ConfigError::Message(format!("invalid LOCK_BATCH_ID_SEED '{}': {}", seed, e))
            })?;
            builder = builder.set_override("lock.batch_id_seed", Some(seed))?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        builder.build()?.try_deserialize()
    }
}
