//! Combined binary for development - runs the order and appointment
//! services in one process.

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::db::MigrateAction;

#[derive(Parser)]
#[command(name = "petshop")]
#[command(about = "Combined pet shop services binary for development")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both services in a single process (development mode)
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "ORDER_SERVICE_PORT", default_value = "8084")]
        order_port: u16,
        #[arg(long, env = "APPOINTMENT_SERVICE_PORT", default_value = "8085")]
        appointment_port: u16,
    },
    /// Run database migrations for both services
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            order_port,
            appointment_port,
        } => {
            info!("Starting combined services in development mode");
            info!("  Order service:       http://{}:{}", host, order_port);
            info!("  Appointment service: http://{}:{}", host, appointment_port);

            // Each service owns its own database and migrates it on connect
            let order_host = host.clone();
            let order_handle = tokio::spawn(async move {
                if let Err(e) = order_service_lib::run_embedded(&order_host, order_port).await {
                    error!("Order service failed: {}", e);
                }
            });

            let appointment_host = host.clone();
            let appointment_handle = tokio::spawn(async move {
                if let Err(e) =
                    appointment_service_lib::run_embedded(&appointment_host, appointment_port).await
                {
                    error!("Appointment service failed: {}", e);
                }
            });

            tokio::select! {
                _ = order_handle => {
                    error!("Order service exited unexpectedly");
                }
                _ = appointment_handle => {
                    error!("Appointment service exited unexpectedly");
                }
            }
        }
        Commands::Migrate { action } => {
            info!("Migrating order database");
            order_service_lib::run_migrations(action).await?;
            info!("Migrating appointment database");
            appointment_service_lib::run_migrations(action).await?;
        }
    }

    Ok(())
}
