//! Falu Account-Lookup Server
//!
//! Resolves which FSP owns an account within a payment-switching network:
//! consumes lookup/associate/disassociate events, routes them to the
//! responsible oracle backend, and answers synchronous peer lookups over
//! HTTP.

mod api;
mod bootstrap;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{get_database_url, load_config};
use falu_core::bus::{ChannelMessagePublisher, MessagePublisher, run_consumer};
use falu_core::event_handler::AccountLookUpEventHandler;
use falu_core::events::{account_lookup_message_channel, reply_channel};
use server::{build_router, run_server};
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Falu - FSP account-lookup and oracle routing service
#[derive(Parser, Debug)]
#[command(name = "falu-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./falu-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting falu-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&args.config, args.listen).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to database: {}", e);
                e
            })?;
        sqlx::migrate!("../migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            e
        })?;
        pool.close().await;
        tracing::info!("Migrations completed successfully");
    }

    // Bus edges: the request channel is fed by the broker consumer wiring,
    // the reply channel drains into the broker producer wiring.
    let (request_tx, request_rx) = account_lookup_message_channel();
    let (reply_tx, mut reply_rx) = reply_channel();
    let publisher: Arc<dyn MessagePublisher> = Arc::new(ChannelMessagePublisher::new(reply_tx));

    // Assemble and initialize the aggregate (all-or-nothing: a failed init
    // tears down every collaborator that already started).
    let oracles = bootstrap::load_oracles(&config, &database_url).await?;
    tracing::info!("Oracle registry holds {} oracle(s)", oracles.len());

    let aggregate =
        bootstrap::build_aggregate(&config, oracles, &database_url, publisher.clone())?;
    aggregate.init().await.map_err(|e| {
        tracing::error!("Failed to initialize account-lookup aggregate: {}", e);
        anyhow::anyhow!(e)
    })?;

    // Event handler + consumer loop
    let handler = Arc::new(AccountLookUpEventHandler::new(aggregate.clone(), publisher));
    handler.init();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_handle = tokio::spawn(run_consumer(request_rx, handler.clone(), shutdown_rx));

    // Reply drain: stands in for the outbound producer wiring.
    let reply_drain = tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            tracing::debug!(key = %reply.key, topic = %reply.topic, "reply published");
        }
    });

    // Build the router and run the HTTP surface until a shutdown signal.
    let listen_addr = config.server.listen;
    let router = build_router(AppState::new(aggregate.clone()));

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Teardown in reverse dependency order.
    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(true);
    let _ = consumer_handle.await;
    handler.destroy();
    aggregate.destroy().await;

    // Dropping the inbound sender ends the consumer; dropping the handler's
    // publisher ends the reply drain.
    drop(request_tx);
    drop(handler);
    drop(aggregate);
    let _ = reply_drain.await;

    tracing::info!("Server shutdown complete");
    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
