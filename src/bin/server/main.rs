//! PC Store Analytics HTTP Server
//!
//! This binary loads the product and sales datasets and serves the analytics API.
//! See [`pcstore_analytics::api`] for the endpoint list.
//!
//! # CLI Commands
//!
//! - `start` - Start the HTTP server (default if no command specified)
//! - `check-config` - Validate configuration and print a summary
//! - `stats` - Load the datasets and print statistics without starting the server
//! - `parse-listings` - Turn captured listing cards into a catalogue file
//!
//! # Configuration
//!
//! The server reads configuration from:
//! 1. `--config` flag or `PCSTORE_CONFIG` environment variable (path to TOML file)
//! 2. `./application.toml` in current directory
//! 3. Default configuration

mod config;

use clap::{Parser, Subcommand};

use config::{apply_cli_overrides, load_config_with_app, ConfigOrigin, ServerConfig};
use pcstore_analytics::{
    api::{build_router, AppState},
    catalog,
    config::ApplicationConfig,
    query::{ProductCatalog, SalesLedger},
    TabularStore,
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Instant};
use tokio::signal;
use tracing::{debug, error, info, warn};

// =============================================================================
// CLI Definition
// =============================================================================

/// PC Store Analytics - inventory and sales analytics server
#[derive(Parser)]
#[command(name = "pcstore-server")]
#[command(version)]
#[command(about = "Inventory and sales analytics over product and sales datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (overrides PCSTORE_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override listen address (e.g., 0.0.0.0:8080)
    #[arg(short, long, global = true)]
    listen: Option<String>,

    /// Override data directory path
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Start,

    /// Validate configuration file without starting the server
    CheckConfig,

    /// Load the datasets and show statistics without starting the server
    Stats {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Parse captured listing cards into a catalogue file
    ParseListings {
        /// Cards captured by the browser driver (product_name, price, image_url, product_url)
        #[arg(short, long)]
        input: PathBuf,

        /// Catalogue file to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Resolve configuration with CLI overrides applied
fn resolve_config(cli: &Cli) -> (ServerConfig, ApplicationConfig, ConfigOrigin) {
    let (_, mut app_config, origin) = load_config_with_app(cli.config.as_deref());
    let config = apply_cli_overrides(
        &mut app_config,
        cli.listen.as_deref(),
        cli.data_dir.as_deref(),
    );
    (config, app_config, origin)
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

// =============================================================================
// CLI Command Handlers
// =============================================================================

/// Validate configuration and print summary
fn cmd_check_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (config, app_config, origin) = resolve_config(cli);
    app_config.validate()?;

    println!("Configuration is valid!");
    println!();
    match origin {
        ConfigOrigin::Explicit(path) => println!("Source: {}", path.display()),
        ConfigOrigin::WorkingDir => println!("Source: application.toml"),
        ConfigOrigin::Defaults => println!("Source: defaults"),
    }
    println!();
    println!("Server Settings:");
    println!("  Listen address: {}", config.listen_addr);
    println!("  Log level: {}", app_config.server.log_level);
    println!("  CORS origins: {:?}", config.cors_allowed_origins);
    println!();
    println!("Datasets:");
    println!("  Data directory: {:?}", config.data_dir);
    println!(
        "  Products: {} ({})",
        config.sources.products.display(),
        presence(&config.sources.products)
    );
    println!(
        "  Sales: {} ({})",
        config.sources.sales.display(),
        presence(&config.sources.sales)
    );
    println!();
    println!("Limits:");
    let limits = &app_config.limits;
    println!(
        "  Daily analytics: default {} days, max {}",
        limits.default_daily_days, limits.max_daily_days
    );
    println!(
        "  Top products: default {}, max {}",
        limits.default_top_products, limits.max_top_products
    );
    println!(
        "  Low stock threshold: {}",
        limits.default_low_stock_threshold
    );
    println!();
    println!("Scraper:");
    println!("  Listing URL: {}", app_config.scraper.listing_url);
    println!("  Max pages: {}", app_config.scraper.max_pages);

    Ok(())
}

fn presence(path: &std::path::Path) -> &'static str {
    if path.exists() {
        "found"
    } else {
        "missing"
    }
}

/// Load the datasets and print statistics
fn cmd_stats(cli: &Cli, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (config, _, _) = resolve_config(cli);
    let store = TabularStore::open(config.sources.clone())?;
    let snapshot = store.snapshot();

    let stats = store.stats();
    let report = snapshot.report();
    let products = ProductCatalog::from_snapshot(&snapshot).stats();
    let sales = SalesLedger::from_snapshot(&snapshot).summary();

    if format == "json" {
        let out = serde_json::json!({
            "data_dir": config.data_dir,
            "store": stats,
            "skipped_sales": report.skipped_sales,
            "products": products,
            "sales": sales,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("PC Store Analytics Statistics");
        println!("=============================");
        println!();
        println!("Data directory: {:?}", config.data_dir);
        println!("Products: {}", stats.products);
        println!("Brands: {}", products.total_brands);
        println!("Low stock products: {}", products.low_stock_count);
        println!("Average price: {:.2}", products.average_price);
        println!();
        if stats.sales_available {
            println!("Sale lines: {}", stats.sales);
            println!("Skipped rows: {}", report.skipped_sales);
            println!("Units sold: {}", sales.total_sales);
            println!("Revenue: {:.2}", sales.total_revenue);
            println!("Profit: {:.2}", sales.total_profit);
            println!("Average margin: {:.2}%", sales.average_profit_margin);
        } else {
            println!("Sales dataset not found");
        }
    }

    Ok(())
}

/// Convert captured listing cards into a catalogue file
fn cmd_parse_listings(
    cli: &Cli,
    input: &std::path::Path,
    output: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_, app_config, _) = resolve_config(cli);
    let base = app_config.scraper.listing_base()?;
    let written = catalog::convert_listings(input, output, &base)?;
    println!("Wrote {} products to {}", written, output.display());
    Ok(())
}

// =============================================================================
// Router and Server Setup
// =============================================================================

/// Graceful shutdown signal handler
///
/// Signal registration failures are logged and the handler then waits forever, so
/// the server keeps running and must be stopped forcefully.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                warn!(
                    error = %e,
                    "Ctrl+C handler installation failed - graceful shutdown unavailable"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "SIGTERM handler installation failed - SIGTERM shutdown unavailable"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Route to appropriate command handler
    match &cli.command {
        Some(Commands::CheckConfig) => return cmd_check_config(&cli),
        Some(Commands::Stats { format }) => return cmd_stats(&cli, format),
        Some(Commands::ParseListings { input, output }) => {
            init_tracing("info");
            return cmd_parse_listings(&cli, input, output);
        }
        Some(Commands::Start) | None => {
            // Continue with server startup below
        }
    }

    let (config, app_config, _) = resolve_config(&cli);
    init_tracing(&app_config.server.log_level);

    info!("Starting PC Store Analytics Server v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "Configuration: listen_addr={}, data_dir={:?}",
        config.listen_addr, config.data_dir
    );

    // Load datasets; a missing or corrupt product catalogue stops startup
    let start = Instant::now();
    let store = match TabularStore::open(config.sources.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "Failed to load datasets");
            return Err(e.into());
        }
    };
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Store ready"
    );

    let state = Arc::new(AppState::new(store, app_config));
    let app = build_router(state);

    // Parse listen address
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run the server until shutdown signal
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
