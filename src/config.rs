//! Configuration management for the analytics backend
//!
//! This module provides configuration file support with TOML format,
//! environment variable overrides, and sensible defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApplicationConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSection,

    /// Dataset locations
    #[serde(default)]
    pub data: DataConfig,

    /// Security settings
    #[serde(default)]
    pub security: SecurityConfig,

    /// Query parameter defaults and bounds
    #[serde(default)]
    pub limits: QueryLimits,

    /// Catalogue scraper settings
    #[serde(default)]
    pub scraper: ScraperConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSection {
    /// Listen address (host:port)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Dataset locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Directory holding both datasets
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Product catalogue file name, relative to `data_dir`
    #[serde(default = "default_products_file")]
    pub products_file: String,

    /// Sales transactions file name, relative to `data_dir`
    #[serde(default = "default_sales_file")]
    pub sales_file: String,
}

/// Security configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityConfig {
    /// CORS allowed origins (empty = allow all origins)
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
}

/// Defaults and upper bounds for query parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryLimits {
    /// Days returned by the daily rollup when none are requested
    #[serde(default = "default_daily_days")]
    pub default_daily_days: usize,

    /// Maximum days accepted by the daily rollup
    #[serde(default = "default_max_daily_days")]
    pub max_daily_days: usize,

    /// Stock threshold used when none is requested
    #[serde(default = "default_low_stock_threshold")]
    pub default_low_stock_threshold: u32,

    /// Look-back window for recent sales when none is requested
    #[serde(default = "default_recent_days")]
    pub default_recent_days: u32,

    /// Top products returned when no limit is requested
    #[serde(default = "default_top_products")]
    pub default_top_products: usize,

    /// Maximum top products per request
    #[serde(default = "default_max_top_products")]
    pub max_top_products: usize,

    /// Days shown in the dashboard trend chart
    #[serde(default = "default_dashboard_daily_days")]
    pub dashboard_daily_days: usize,

    /// Products shown in the dashboard top list
    #[serde(default = "default_dashboard_top_products")]
    pub dashboard_top_products: usize,
}

/// Catalogue scraper configuration
///
/// The browser driver walks `listing_url` for up to `max_pages` pages; relative links
/// in the cards it captures resolve against `listing_url`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Listing page the driver starts from
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Maximum number of listing pages to walk
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_products_file() -> String {
    "megapc_products_updated.csv".to_string()
}
fn default_sales_file() -> String {
    "sales_data.csv".to_string()
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}
fn default_daily_days() -> usize {
    30
}
fn default_max_daily_days() -> usize {
    365
}
fn default_low_stock_threshold() -> u32 {
    10
}
fn default_recent_days() -> u32 {
    7
}
fn default_top_products() -> usize {
    10
}
fn default_max_top_products() -> usize {
    50
}
fn default_dashboard_daily_days() -> usize {
    7
}
fn default_dashboard_top_products() -> usize {
    5
}
fn default_listing_url() -> String {
    "https://megapc.tn/shop/PC%20PORTABLE/PC%20PORTABLE%20GAMER".to_string()
}
fn default_max_pages() -> u32 {
    4
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            products_file: default_products_file(),
            sales_file: default_sales_file(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: default_cors_origins(),
        }
    }
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_daily_days: default_daily_days(),
            max_daily_days: default_max_daily_days(),
            default_low_stock_threshold: default_low_stock_threshold(),
            default_recent_days: default_recent_days(),
            default_top_products: default_top_products(),
            max_top_products: default_max_top_products(),
            dashboard_daily_days: default_dashboard_daily_days(),
            dashboard_top_products: default_dashboard_top_products(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            max_pages: default_max_pages(),
        }
    }
}

impl DataConfig {
    /// Full path of the product catalogue
    pub fn products_path(&self) -> PathBuf {
        self.data_dir.join(&self.products_file)
    }

    /// Full path of the sales transactions
    pub fn sales_path(&self) -> PathBuf {
        self.data_dir.join(&self.sales_file)
    }
}

impl ScraperConfig {
    /// Parsed listing page URL; must be absolute http(s)
    pub fn listing_base(&self) -> Result<Url> {
        let url = Url::parse(&self.listing_url).map_err(|e| {
            Error::Configuration(format!("Invalid listing_url '{}': {}", self.listing_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(Error::Configuration(format!(
                "listing_url must use http or https, got '{}'",
                scheme
            ))),
        }
    }
}

impl ApplicationConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config: Self = toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Server
        if let Ok(addr) = std::env::var("PCSTORE_LISTEN_ADDR") {
            self.server.listen_addr = addr;
        }

        // Data
        if let Ok(dir) = std::env::var("PCSTORE_DATA_DIR") {
            if dir.trim().is_empty() {
                return Err(Error::Configuration(
                    "PCSTORE_DATA_DIR is set but empty".to_string(),
                ));
            }
            self.data.data_dir = PathBuf::from(dir);
        }
        if let Ok(file) = std::env::var("PCSTORE_PRODUCTS_FILE") {
            self.data.products_file = file;
        }
        if let Ok(file) = std::env::var("PCSTORE_SALES_FILE") {
            self.data.sales_file = file;
        }

        // Logging
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            if !log_level.trim().is_empty() {
                self.server.log_level = log_level;
            }
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| {
                Error::Configuration(format!(
                    "Invalid listen address '{}': {}",
                    self.server.listen_addr, e
                ))
            })?;

        if self.data.data_dir.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "Data directory cannot be empty".to_string(),
            ));
        }
        if self.data.products_file.trim().is_empty() || self.data.sales_file.trim().is_empty() {
            return Err(Error::Configuration(
                "Dataset file names cannot be empty".to_string(),
            ));
        }

        let limits = &self.limits;
        if limits.max_daily_days == 0 {
            return Err(Error::Configuration(
                "max_daily_days must be > 0".to_string(),
            ));
        }
        if limits.max_top_products == 0 {
            return Err(Error::Configuration(
                "max_top_products must be > 0".to_string(),
            ));
        }
        if limits.default_daily_days == 0 || limits.default_daily_days > limits.max_daily_days {
            return Err(Error::Configuration(format!(
                "default_daily_days must be within 1..={}",
                limits.max_daily_days
            )));
        }
        if limits.default_top_products == 0
            || limits.default_top_products > limits.max_top_products
        {
            return Err(Error::Configuration(format!(
                "default_top_products must be within 1..={}",
                limits.max_top_products
            )));
        }
        if limits.default_recent_days == 0 {
            return Err(Error::Configuration(
                "default_recent_days must be > 0".to_string(),
            ));
        }

        self.scraper.listing_base()?;
        if self.scraper.max_pages == 0 {
            return Err(Error::Configuration("max_pages must be > 0".to_string()));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
