//! Configuration management for the Restaurant Inventory Management Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with RIM_ prefix

use chrono::NaiveTime;
use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Inventory engine configuration
    pub inventory: InventoryConfig,

    /// Transfer scheduler configuration
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Threshold applied when an item has no configured threshold row
    pub default_low_stock_threshold: f64,

    /// How long resolved thresholds stay cached, in seconds
    pub threshold_cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Master switch for the background jobs
    pub enabled: bool,

    /// Wall-clock time the surplus-to-today transfer fires, "HH:MM"
    pub surplus_to_today_at: String,

    /// Wall-clock time the today-to-surplus transfer fires, "HH:MM"
    pub today_to_surplus_at: String,

    /// Interval between spoilage scans, in seconds
    pub spoilage_scan_interval_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RIM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("inventory.default_low_stock_threshold", 100.0)?
            .set_default("inventory.threshold_cache_ttl_secs", 60)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.surplus_to_today_at", "06:00")?
            .set_default("scheduler.today_to_surplus_at", "22:00")?
            .set_default("scheduler.spoilage_scan_interval_secs", 300)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (RIM_ prefix)
            .add_source(
                Environment::with_prefix("RIM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl InventoryConfig {
    /// Default threshold as the Decimal the classifier works in
    pub fn default_threshold(&self) -> Decimal {
        Decimal::from_f64_retain(self.default_low_stock_threshold)
            .unwrap_or_else(|| Decimal::from(100))
    }
}

impl SchedulerConfig {
    /// Parse a configured "HH:MM" fire time
    pub fn parse_fire_time(value: &str) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(value, "%H:%M")
            .map_err(|e| ConfigError::Message(format!("invalid fire time '{}': {}", value, e)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
