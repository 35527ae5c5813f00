#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod cli;

use anyhow::Result;
use chatkeeper::chat::{BridgeService, ChatService, Session};
use chatkeeper::policy::ArchivePolicy;
use chatkeeper::sched::{EventPump, Scheduler};
use chatkeeper::Config;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_init()?,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Config => {
            println!("◆ chatkeeper config — {}", config.config_path.display());
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run(config: Config) -> Result<()> {
    println!("◆ chatkeeper");
    println!("  › config  {}", config.config_path.display());
    println!(
        "  › bridge  {} {}",
        config.bridge.command,
        config.bridge.args.join(" ")
    );
    println!();

    let config = Arc::new(config);
    let service: Arc<dyn ChatService> = Arc::new(BridgeService::spawn(&config.bridge)?);
    let session = Arc::new(Session::new());
    let policy = Arc::new(ArchivePolicy::new(
        Arc::clone(&service),
        Arc::clone(&session),
        &config.archive,
    ));

    let pump = Arc::new(EventPump::new(
        Arc::clone(&service),
        Arc::clone(&session),
        policy,
        &config.reliability,
    ));
    let pump_task = tokio::spawn(Arc::clone(&pump).run());

    let scheduler = Scheduler::new(Arc::clone(&service), Arc::clone(&session), Arc::clone(&config));

    tokio::select! {
        () = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            println!();
            tracing::info!("shutting down");
            if let Err(e) = service.disconnect().await {
                tracing::warn!("disconnect on shutdown failed: {e:#}");
            }
        }
    }

    pump_task.abort();
    Ok(())
}
