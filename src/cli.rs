use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "chatkeeper",
    version,
    about = "Unattended housekeeping for a chat account: archives idle conversations, keeps a day/night connection schedule"
)]
pub struct Cli {
    /// Use an explicit config file instead of ~/.chatkeeper/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the housekeeping daemon (default)
    Run,
    /// Print the effective configuration
    Config,
}
