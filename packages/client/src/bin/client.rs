//! Terminal chat client.
//!
//! Reads the bearer credential from a client storage file (`{"auth_token": "..."}`),
//! connects to the chat backend and opens an interactive prompt.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tabiji-client -- --user alice --storage alice.json
//! cargo run --bin tabiji-client -- -u bob -s bob.json --api-url http://127.0.0.1:3000
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tabiji_chat::{
    ChatConfig,
    domain::{CredentialStore, UserId},
    infrastructure::credential::FileCredentialStore,
};
use tabiji_client::{ClientError, run_client};
use tabiji_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tabiji-client")]
#[command(about = "Terminal chat client for Tabiji", long_about = None)]
struct Args {
    /// Your user id
    #[arg(short = 'u', long)]
    user: String,

    /// Client storage file holding the auth token
    #[arg(short = 's', long, default_value = "tabiji-client.json")]
    storage: PathBuf,

    /// Backend origin for the REST API
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// WebSocket endpoint (derived from --api-url when omitted)
    #[arg(long)]
    socket_url: Option<String>,
}

fn build_config(args: &Args) -> Result<ChatConfig, String> {
    match &args.socket_url {
        Some(socket_url) => Ok(ChatConfig::with_endpoints(
            args.api_url.clone(),
            socket_url.clone(),
        )),
        None => ChatConfig::for_base_url(&args.api_url)
            .ok_or_else(|| format!("--api-url must be http(s), got '{}'", args.api_url)),
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };
    let me = match UserId::new(args.user.clone()) {
        Ok(me) => me,
        Err(e) => {
            tracing::error!("Invalid --user: {}", e);
            std::process::exit(2);
        }
    };

    let credentials = Arc::new(FileCredentialStore::new(&args.storage));
    if credentials.auth_token().is_none() {
        let error = ClientError::MissingCredential(args.storage.display().to_string());
        tracing::error!("{}", error);
        std::process::exit(1);
    }

    if let Err(e) = run_client(config, me, credentials).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
