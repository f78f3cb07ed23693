use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "scanbot")]
#[command(about = "Scanbot - drive a network scanner from a Telegram chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot and serve chats until interrupted
    Run(CommonArgs),
    /// Load and validate the configuration, then print it with secrets redacted
    CheckConfig(CommonArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// TOML configuration file; defaults to ~/.config/scanbot/config.toml, then the environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `scanbot_application=trace` (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            init_logging(args.log_level.as_deref());
            commands::run::execute(args.config.as_deref()).await?
        }
        Commands::CheckConfig(args) => {
            init_logging(args.log_level.as_deref());
            commands::check_config::execute(args.config.as_deref())?
        }
    }

    Ok(())
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
