use anyhow::Result;
use clap::Parser;
use procurement_cart::{
    cli::{Args, CliApp},
    utils::Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_env();
    let default_level = match (&config, args.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.log_level.clone(),
        (Err(_), false) => "info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = config.map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::debug!(
        "Configuration loaded for {} environment",
        config.environment
    );

    let app = CliApp::new(config)?;
    app.run(args).await
}
