use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use topiclink_cli::cli::{Cli, Commands};
use topiclink_cli::output::print_error;
use topiclink_cli::{commands, manifest};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let manifest = manifest::load(&cli.manifest)?;
    let endpoint = cli.endpoint.as_deref();

    match cli.command {
        Commands::Deploy => commands::deploy::run(&manifest, endpoint).await,
        Commands::Remove => commands::remove::run(&manifest, endpoint).await,
        Commands::Teardown => commands::teardown::run(&manifest, endpoint).await,
    }
}

fn init_tracing(level: &str) {
    // Prefer RUST_LOG from env, otherwise use the --log-level flag.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
