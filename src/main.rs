use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use spdlog::{info, warn};

use pressed::config::open_config;
use pressed::logger::configure_logger;
use pressed::server::server_run;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,
}

#[ntex::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config_path.map(PathBuf::from);

    let config = match open_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Please run pressed --help");
            return Ok(());
        }
    };

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    info!("Starting Pressed =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");
    info!("Listening on {}:{}", config.server.address, config.server.port);

    server_run(config).await?;
    Ok(())
}
