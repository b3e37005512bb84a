//! API gateway entry point.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api_gateway::api::{create_router, AppState};
use api_gateway::config::Config;
use api_gateway::utils::shutdown_signal;

/// Minimal HTTP API gateway.
#[derive(Parser, Debug)]
#[command(name = "api-gateway")]
#[command(about = "HTTP API gateway: prefix routing, bearer-token auth, rate limiting, metrics")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway (default).
    Run {
        /// Listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("api_gateway=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Run { port }) => cmd_run(port.or(args.port)).await,
        None => cmd_run(args.port).await,
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("API GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Environment: {}", config.app_env);
    println!(
        "  JWT Secret: {}",
        if config.jwt_secret.as_deref().is_some_and(|s| !s.is_empty()) {
            "present"
        } else {
            "MISSING (development default will be used)"
        }
    );
    println!("  Auth Service: {}", config.auth_service_url);
    println!("  Task Service: {}", config.task_service_url);
    println!("  Billing Service: {}", config.billing_service_url);
    println!(
        "  Rate Limit: {} requests / {}s window",
        config.rate_limit_max_requests, config.rate_limit_window_secs
    );
    println!("  Error Log: {}", config.error_log_path);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the gateway.
async fn cmd_run(port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Environment: {}", config.app_env);

    // Create app state
    let state = AppState::from_config(&config).await?;

    for route in state.routes.routes() {
        info!(
            prefix = route.prefix,
            upstream = %route.upstream,
            auth = route.requires_auth,
            "route registered"
        );
    }

    // Drop expired rate windows on a window cadence.
    let limiter = state.limiter.clone();
    let window = Duration::from_secs(config.rate_limit_window_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(window);
        ticker.tick().await; // first tick completes immediately
        loop {
            ticker.tick().await;
            limiter.prune();
        }
    });

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("API Gateway running on port {}", config.port);

    let router = create_router(state);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Shutdown complete");
    Ok(())
}
