use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::session::Storefront;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub api_timeout: Duration,
    pub storage_dir: PathBuf,
    pub storefront: Storefront,
    pub log_level: String,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let timeout_secs: u64 = env::var("PROCURE_API_TIMEOUT_SECS")
            .unwrap_or("15".to_string())
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("PROCURE_API_TIMEOUT_SECS is not a number: {}", e))?;

        let storefront: Storefront = env::var("PROCURE_STOREFRONT")
            .unwrap_or("office".to_string())
            .parse()?;

        let config = Config {
            api_url: env::var("PROCURE_API_URL")
                .unwrap_or("http://localhost:8080/api".to_string())
                .trim()
                .to_string(),
            api_token: env::var("PROCURE_API_TOKEN")
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            api_timeout: Duration::from_secs(timeout_secs),
            storage_dir: PathBuf::from(
                env::var("PROCURE_STORAGE_DIR").unwrap_or(".procure".to_string()),
            ),
            storefront,
            log_level: env::var("LOG_LEVEL").unwrap_or("info".to_string()),
            environment: env::var("APP_ENV").unwrap_or("development".to_string()),
        };

        tracing::info!(
            "Config: successfully loaded for {} environment ({} storefront)",
            config.environment,
            config.storefront
        );
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("PROCURE_API_URL is not set"));
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "PROCURE_API_URL must start with 'http://' or 'https://'"
            ));
        }

        if self.is_production() && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!("PROCURE_API_URL must use https in production"));
        }

        if self.api_timeout.is_zero() {
            return Err(anyhow::anyhow!("PROCURE_API_TIMEOUT_SECS must be positive"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
