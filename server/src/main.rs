use clap::Parser;
use log::{error, info};
use server::config::{ServerConfig, MIN_PORT};
use server::network::Server;
use std::sync::Arc;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080", value_parser = clap::value_parser!(u16).range(MIN_PORT as i64..))]
    port: u16,
    /// Maximum number of simultaneous connections
    #[clap(short, long, default_value = "64")]
    max_clients: usize,
    /// Longest accepted request line in bytes
    #[clap(long, default_value = "8192")]
    max_line_bytes: usize,
}

/// Main-method of the application.
/// Parses command-line arguments, starts the accept loop and waits for Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ServerConfig {
        max_clients: args.max_clients,
        max_line_bytes: args.max_line_bytes,
        ..ServerConfig::new(&args.host, args.port)
    };

    let server = Arc::new(Server::bind(config).await?);

    let server_handle = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.run().await })
    };

    tokio::select! {
        result = server_handle => {
            match result {
                Ok(Ok(())) => info!("Server stopped"),
                Ok(Err(e)) => error!("Server failed: {}", e),
                Err(e) => error!("Network task panicked: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            server.shutdown().await;
        }
    }

    Ok(())
}
