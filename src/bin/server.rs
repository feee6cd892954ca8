//! Multi-room WebSocket chat server.
//!
//! Clients join a (channel_id, room_id) pair over `/chat` and exchange
//! messages fanned out to the other members of that room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 9003
//! ```

use clap::Parser;
use roomcast::{common::logger::setup_logger, server::run_server};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Multi-room WebSocket chat server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "9003")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run_server(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
