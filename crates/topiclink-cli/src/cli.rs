use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "topiclink")]
#[command(about = "Reconcile declared function-to-topic subscriptions against AWS")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the deployment manifest
    #[arg(
        short,
        long,
        global = true,
        env = "TOPICLINK_MANIFEST",
        default_value = "topiclink.toml"
    )]
    pub manifest: String,

    /// AWS endpoint override (e.g. LocalStack)
    #[arg(long, global = true, env = "TOPICLINK_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Converge live subscriptions to the manifest and settle the state record
    Deploy,
    /// Unsubscribe every declared binding (no state diff)
    Remove,
    /// Delete every recorded subscription and the state record itself
    Teardown,
}
