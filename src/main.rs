mod commands;
mod providers;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use commands::catalog::CatalogKind;

#[derive(Parser)]
#[command(name = "calbill")]
#[command(about = "Import calendar appointments and bill them through e-conomic or Billy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List calendar events that haven't been imported yet
    Events,
    /// Import new calendar events as appointments
    Import,
    /// List series that are ready to be invoiced
    Series,
    /// Export series as invoices
    Export {
        /// Ids of the series to export
        #[arg(required = true)]
        series_ids: Vec<u64>,

        /// Billing system to export to, "economic" or "billy" (defaults to billing_system)
        #[arg(short, long)]
        system: Option<String>,
    },
    /// Synchronize customers or products from a billing system
    Catalog {
        kind: CatalogKind,

        /// Billing system to read from (defaults to billing_system from config)
        #[arg(short, long)]
        system: Option<String>,
    },
    /// Create the Default customer and appointment type used for unmatched events
    Defaults {
        /// Billing system contact id invoices for unmatched customers go to
        #[arg(long)]
        contact_id: String,

        /// Billing system product id used for unmatched appointment types
        #[arg(long)]
        product_id: String,

        #[arg(long, default_value_t = 0.0)]
        price: f64,
    },
    /// Show store contents and when the last import and export ran
    Status,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Events => commands::events::run().await,
        Commands::Import => commands::import::run().await,
        Commands::Series => commands::series::run().await,
        Commands::Export { series_ids, system } => commands::export::run(series_ids, system).await,
        Commands::Catalog { kind, system } => commands::catalog::run(kind, system).await,
        Commands::Defaults {
            contact_id,
            product_id,
            price,
        } => commands::defaults::run(contact_id, product_id, price).await,
        Commands::Status => commands::status::run().await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}
