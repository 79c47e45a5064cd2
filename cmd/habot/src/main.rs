//! HaBot host - console chat and webhook for the voice profile bot.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod chat;
mod config;
mod server;

use config::Config;

/// HaBot host.
///
/// Runs the voice profile bot either as an interactive console chat or as an
/// HTTP webhook. Configuration is stored in ~/.habot/config.yaml; the
/// subscription keys can also come from HABOT_SPEAKER_KEY,
/// HABOT_SENTIMENT_KEY and HABOT_SPEECH_KEY.
#[derive(Parser)]
#[command(name = "habot")]
#[command(about = "Voice profile bot")]
#[command(version)]
struct Cli {
    /// Config file (default is ~/.habot/config.yaml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Chat with the bot in this terminal
    Chat,
    /// Serve the bot over HTTP
    Serve {
        /// Listen address (overrides server.listen)
        #[arg(long)]
        listen: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config with keys masked
    View,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = Config::resolve_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Config(ConfigCommand::Init { force }) => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Config::default().save(&path)?;
            println!("Wrote {}", path.display());
        }
        Commands::Config(ConfigCommand::View) => {
            let cfg = Config::load(&path)?;
            println!("# {}", path.display());
            print!("{}", serde_yaml::to_string(&cfg.masked())?);
        }
        Commands::Chat => {
            let cfg = Config::load(&path)?;
            let bot = app::build_bot(&cfg).await?;
            chat::run(&bot).await?;
        }
        Commands::Serve { listen } => {
            let cfg = Config::load(&path)?;
            let addr = listen.unwrap_or_else(|| cfg.server.listen.clone());
            let bot = Arc::new(app::build_bot(&cfg).await?);
            server::serve(&addr, bot).await?;
        }
    }
    Ok(())
}
