mod cli;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use pixelq::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    pixelq::observability::init_tracing();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => {
            let _ = dotenvy::dotenv();
            Config::load_from_path(path.clone())?
        }
        None => Config::load()?,
    };

    match cli.command {
        Commands::Directory(args) => {
            args.apply(&mut config);
            server::run_directory(config).await?
        }
        Commands::Ledger(args) => {
            args.apply(&mut config);
            server::run_ledger(config).await?
        }
        Commands::Storage(args) => {
            args.apply(&mut config);
            server::run_storage(config).await?
        }
        Commands::Coordinator(args) => {
            args.apply(&mut config);
            server::run_coordinator(config).await?
        }
        Commands::Worker(args) => {
            args.apply(&mut config);
            server::run_worker(config).await?
        }
        Commands::Gateway(args) => {
            args.apply(&mut config);
            server::run_gateway(config).await?
        }
        Commands::Standalone(args) => {
            args.apply(&mut config);
            server::run_standalone(config).await?
        }
        Commands::PrintConfig => println!("{}", toml::to_string_pretty(&config)?),
    }

    Ok(())
}
