// codeflow/crates/codeflow/src/main.rs

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use codeflow::{config::Config, run_server};
#[cfg(feature = "cli")]
use dotenvy::dotenv;

/// Concept-tracking backend for programming course material.
#[cfg(feature = "cli")]
#[derive(Debug, Parser)]
#[command(name = "codeflow", version, about)]
struct Cli {
    /// Bind address, overrides API_HOST
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides PORT
    #[arg(long)]
    port: Option<u16>,
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let mut cfg = Config::from_env()?;
    if let Some(host) = cli.host {
        cfg.api_host = host;
    }
    if let Some(port) = cli.port {
        cfg.api_port = port;
    }

    run_server(cfg).await
}

#[cfg(not(feature = "cli"))]
fn main() {
    println!("CLI feature not enabled. Enable with --features cli");
}
