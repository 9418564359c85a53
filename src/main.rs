use clap::Parser;
use anyhow::Result;
use cubic_invoice::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    // stdout carries the JSON output.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    run(cli).await
}
