//! Order Service - HTTP API for order placement and fulfillment.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use order_service_lib::MigrateAction;

#[derive(Parser)]
#[command(name = "order-service", about = "Order fulfillment microservice")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the orders API
    Serve {
        #[arg(long, env = "ORDER_SERVICE_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "ORDER_SERVICE_PORT", default_value_t = 8084)]
        port: u16,
    },
    /// Manage the order database schema
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Serve { host, port } => order_service_lib::run_embedded(&host, port).await,
        Command::Migrate { action } => order_service_lib::run_migrations(action).await,
    }
}
