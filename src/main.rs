//! Vanguard CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vanguard::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.json).await,
        Commands::Run(args) => commands::run::execute(args, cli.json).await,
        Commands::Start(args) => commands::start::execute(args, cli.json).await,
        Commands::Cancel(args) => commands::cancel::execute(args, cli.json).await,
        Commands::Status(args) => commands::status::execute(args, cli.json).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.json).await,
        Commands::Version(args) => commands::version::execute(args, cli.json).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
