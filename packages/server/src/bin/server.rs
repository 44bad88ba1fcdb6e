//! Development chat backend.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tabiji-server -- --seed-user alice:Alice:tok-a --seed-user bob:Bob:tok-b
//! cargo run --bin tabiji-server -- --host 0.0.0.0 --port 3000 --seed-user alice:Alice:tok-a
//! ```

use clap::Parser;
use tabiji_server::{
    infrastructure::repository::SeedUser,
    ui::{AppState, Server},
};
use tabiji_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tabiji-server")]
#[command(about = "Development chat backend for Tabiji", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// User known to the backend, as `id:name:token` (repeatable)
    #[arg(short = 'u', long = "seed-user", value_name = "ID:NAME:TOKEN")]
    seed_users: Vec<SeedUser>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    if args.seed_users.is_empty() {
        tracing::warn!("No --seed-user given, every connection will be rejected");
    }
    for seed in &args.seed_users {
        tracing::info!("Seeded user '{}' ({})", seed.id, seed.name);
    }

    let server = Server::new(AppState::in_memory(args.seed_users));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
