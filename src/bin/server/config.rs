//! Server Configuration
//!
//! This module handles loading and managing server configuration.

use pcstore_analytics::config::ApplicationConfig;
use pcstore_analytics::store::DataSources;
use std::path::{Path, PathBuf};

/// Server runtime configuration derived from ApplicationConfig
///
/// This is the subset of the configuration the binary itself acts on; handlers
/// receive the full `ApplicationConfig`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server address
    pub listen_addr: String,

    /// Directory holding both datasets
    pub data_dir: PathBuf,

    /// Resolved dataset paths
    pub sources: DataSources,

    /// CORS allowed origins (empty = allow all origins)
    pub cors_allowed_origins: Vec<String>,
}

impl From<ApplicationConfig> for ServerConfig {
    /// Convert from ApplicationConfig to ServerConfig
    fn from(app_config: ApplicationConfig) -> Self {
        Self {
            sources: DataSources::from(&app_config.data),
            listen_addr: app_config.server.listen_addr,
            data_dir: app_config.data.data_dir,
            cors_allowed_origins: app_config.security.cors_allowed_origins,
        }
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Explicit path from `--config` or `PCSTORE_CONFIG`
    Explicit(PathBuf),
    /// `./application.toml`
    WorkingDir,
    /// Built-in defaults plus environment overrides
    Defaults,
}

/// Load configuration from file or environment
///
/// Priority:
/// 1. `--config` flag, then the PCSTORE_CONFIG environment variable
/// 2. application.toml
/// 3. Default configuration with environment overrides
pub fn load_config_with_app(
    explicit: Option<&Path>,
) -> (ServerConfig, ApplicationConfig, ConfigOrigin) {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PCSTORE_CONFIG").map(PathBuf::from));

    if let Some(path) = explicit {
        match ApplicationConfig::load(&path) {
            Ok(config) => {
                eprintln!("[config] Loaded configuration from: {}", path.display());
                let server_config = ServerConfig::from(config.clone());
                return (server_config, config, ConfigOrigin::Explicit(path));
            }
            Err(e) => {
                eprintln!(
                    "[config] Failed to load config from {}: {}. Trying defaults.",
                    path.display(),
                    e
                );
            }
        }
    }

    let app_toml_path = Path::new("application.toml");
    if app_toml_path.exists() {
        match ApplicationConfig::load(app_toml_path) {
            Ok(config) => {
                eprintln!("[config] Loaded configuration from application.toml");
                let server_config = ServerConfig::from(config.clone());
                return (server_config, config, ConfigOrigin::WorkingDir);
            }
            Err(e) => {
                eprintln!(
                    "[config] Failed to parse application.toml: {}. Using defaults.",
                    e
                );
            }
        }
    }

    // Use defaults with environment variable overrides
    eprintln!("[config] Using default configuration");
    let mut app_config = ApplicationConfig::default();
    if let Err(e) = app_config.apply_env_overrides() {
        eprintln!("[config] Failed to apply environment overrides: {}", e);
    }
    let server_config = ServerConfig::from(app_config.clone());
    (server_config, app_config, ConfigOrigin::Defaults)
}

/// Apply `--listen` and `--data-dir` on top of the loaded configuration
pub fn apply_cli_overrides(
    app_config: &mut ApplicationConfig,
    listen: Option<&str>,
    data_dir: Option<&Path>,
) -> ServerConfig {
    if let Some(listen) = listen {
        app_config.server.listen_addr = listen.to_string();
    }
    if let Some(data_dir) = data_dir {
        app_config.data.data_dir = data_dir.to_path_buf();
    }
    ServerConfig::from(app_config.clone())
}
