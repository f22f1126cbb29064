use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable carrying the weather provider API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";
/// Environment variable overriding the provider base URL.
pub const BASE_URL_ENV: &str = "WEATHER_API_BASE_URL";

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Weather provider settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Map view settings
    #[serde(default)]
    pub map: MapConfig,

    /// Regional admission gate for the location list
    #[serde(default)]
    pub region: RegionConfig,

    /// Dashboard startup behaviour
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Provider base URL, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Provider API key. Usually supplied through `WEATHER_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// The API key, failing fast when it is missing or blank.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingSetting(format!(
                "api.api_key (set {})",
                API_KEY_ENV
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial lower bound of the temperature filter (°C)
    #[serde(default = "default_min_temp")]
    pub min_temp_c: f64,

    /// Initial upper bound of the temperature filter (°C)
    #[serde(default = "default_max_temp")]
    pub max_temp_c: f64,

    /// Draw the temperature heat layer
    #[serde(default)]
    pub show_heatmap: bool,

    #[serde(default = "default_true")]
    pub show_legend: bool,
}

fn default_min_temp() -> f64 {
    -10.0
}

fn default_max_temp() -> f64 {
    40.0
}

fn default_true() -> bool {
    true
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            min_temp_c: default_min_temp(),
            max_temp_c: default_max_temp(),
            show_heatmap: false,
            show_legend: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Only admit records whose region contains `region_substring`
    #[serde(default = "default_true")]
    pub restrict_to_region: bool,

    /// Case-insensitive region match, e.g. "Western Cape"
    #[serde(default = "default_region_substring")]
    pub region_substring: String,
}

fn default_region_substring() -> String {
    "Western Cape".to_string()
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            restrict_to_region: true,
            region_substring: default_region_substring(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Suburbs fetched in bulk when the dashboard starts
    #[serde(default = "default_suburbs")]
    pub default_suburbs: Vec<String>,

    #[serde(default = "default_true")]
    pub seed_on_start: bool,
}

fn default_suburbs() -> Vec<String> {
    [
        "Rondebosch",
        "Newlands",
        "Kommetjie",
        "Oranjezicht",
        "Sea Point",
        "Claremont",
        "Constantia",
        "Camps Bay",
        "Green Point",
        "Milnerton",
        "Muizenberg",
        "Durbanville",
        "Simon's Town",
        "Bellville",
        "Parklands",
        "Salt River",
        "Atlantis",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_suburbs: default_suburbs(),
            seed_on_start: true,
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Apply environment-style overrides. `lookup` returns the value of a variable.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.api_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url.trim_end_matches('/').to_string();
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api.base_url, "api.base_url", &mut result);

        if let Err(e) = self.api.require_api_key() {
            result.add_error("api.api_key", e.to_string());
        }

        if self.api.timeout_secs == 0 {
            result.add_error("api.timeout_secs", "Timeout must be greater than 0");
        } else if self.api.timeout_secs > 120 {
            result.add_warning("api.timeout_secs", "Timeout is unusually long (>120s)");
        }

        if !self.map.min_temp_c.is_finite() || !self.map.max_temp_c.is_finite() {
            result.add_error("map", "Temperature bounds must be finite numbers");
        } else if self.map.min_temp_c > self.map.max_temp_c {
            result.add_error(
                "map.min_temp_c",
                format!(
                    "Minimum ({}) is greater than maximum ({})",
                    self.map.min_temp_c, self.map.max_temp_c
                ),
            );
        }

        if self.region.restrict_to_region && self.region.region_substring.trim().is_empty() {
            result.add_error(
                "region.region_substring",
                "Region filter is enabled but no region is set",
            );
        }

        if self.dashboard.seed_on_start && self.dashboard.default_suburbs.is_empty() {
            result.add_warning("dashboard.default_suburbs", "No default suburbs to seed");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`. Environment overrides are written too.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("user config directory".to_string()))?
            .join("capeweather");

        Ok(config_dir.join("config.toml"))
    }
}
