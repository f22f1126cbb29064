pub mod config;
pub mod error;

pub use config::{ApiConfig, Config, DashboardConfig, MapConfig, RegionConfig, ValidationResult};
pub use error::{
    AppError, ConfigError, ProviderError, ReqwestErrorExt, ValidationError,
    FALLBACK_PROVIDER_MESSAGE,
};

use anyhow::Result;

/// Initialize logging for the dashboard process.
///
/// Honors `RUST_LOG`; defaults to `info`. Safe to call more than once.
pub fn init() -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("CapeWeather core initialized");
    }
    Ok(())
}
