//! donorprobe CLI entry point.

use anyhow::Result;
use clap::Parser;

use donorprobe::cli::{commands, handle_error, Cli, Commands};
use donorprobe::domain::models::Config;
use donorprobe::infrastructure::{init_tracing, ConfigLoader};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };
    init_tracing(&config.logging);

    let result = match cli.command {
        Commands::Investigate(args) => commands::investigate::execute(args, config, cli.json).await,
        Commands::Window(args) => commands::window::execute(args, config, cli.json).await,
        Commands::Donors(args) => commands::donors::execute(args, config, cli.json).await,
        Commands::Rank(args) => commands::rank::execute(args, config, cli.json).await,
        Commands::Outlier(args) => commands::outlier::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}

fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
