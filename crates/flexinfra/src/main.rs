mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flexinfra")]
#[command(about = "Describe servers once, provision them on any cloud", long_about = None)]
struct Cli {
    /// Infrastructure file (skips the infra.yaml lookup)
    #[arg(short, long, global = true, env = "FLEXINFRA_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the infrastructure file without contacting any cloud
    Validate,
    /// Show the resources `up` would create
    Plan,
    /// Provision networks and servers
    Up {
        /// Skip the vendor CLI check
        #[arg(long)]
        no_check: bool,
    },
    /// Configure the provisioned servers
    Deploy,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("flexinfra {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (path, config) = flexinfra::load_config(cli.config.as_deref())?;
    tracing::debug!("Using {}", path.display());

    match cli.command {
        Commands::Validate => commands::validate::handle(&path, &config),
        Commands::Plan => commands::plan::handle(&config).await,
        Commands::Up { no_check } => commands::up::handle(&config, no_check).await,
        Commands::Deploy => commands::deploy::handle(&config),
        Commands::Version => Ok(()),
    }
}
