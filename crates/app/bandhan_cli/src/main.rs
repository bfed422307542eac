// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use bandhan_core::config::BandhanConfig;
use clap::Parser;
use cli::{Cli, Commands};

mod app;
mod cli;
mod logging;
mod prompt;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        command => {
            let app = app::App::new(BandhanConfig::from_env()?)?;
            match command {
                Commands::Map(map) => app.map(map).await?,
                Commands::Tenants => app.tenants().await?,
                Commands::Subscriptions { tenant } => app.subscriptions(&tenant).await?,
                Commands::ClientServices => app.client_services().await?,
                Commands::Version => {}
            }
        }
    }

    Ok(())
}
