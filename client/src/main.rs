use clap::Parser;
use client::network::Connection;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    let mut conn = Connection::connect(&args.server).await?;
    println!("Connected");
    println!("Enter commands to server or ctrl-D to quit");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await? {
        if line.is_empty() {
            continue;
        }
        println!("Sent: {}", line);
        let reply = conn.send_line(&line).await?;
        println!("Received: {}", reply);
    }

    Ok(())
}
