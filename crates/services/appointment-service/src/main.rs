//! Appointment Service - HTTP API for appointment booking.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use appointment_service_lib::MigrateAction;

#[derive(Parser)]
#[command(name = "appointment-service", about = "Appointment booking microservice")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the appointments API
    Serve {
        #[arg(long, env = "APPOINTMENT_SERVICE_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "APPOINTMENT_SERVICE_PORT", default_value_t = 8085)]
        port: u16,
    },
    /// Manage the appointment database schema
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
        Command::Serve { host, port } => appointment_service_lib::run_embedded(&host, port).await,
        Command::Migrate { action } => appointment_service_lib::run_migrations(action).await,
    }
}
