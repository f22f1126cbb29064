//! Centralized error types for the CapeWeather dashboard.
//!
//! This module provides a typed error hierarchy that:
//! - Separates provider, configuration and input failures
//! - Provides user-friendly messages suitable for the dashboard banner
//! - Preserves full error context for logging

use thiserror::Error;

/// Message shown when the provider fails without saying why.
pub const FALLBACK_PROVIDER_MESSAGE: &str = "API Error";

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Weather provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Errors surfaced through `anyhow` context chains, e.g. config file I/O.
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Provider(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Validation(e) => e.user_message(),
            AppError::Other(e) => {
                if let Some(config) = e.downcast_ref::<ConfigError>() {
                    config.user_message()
                } else if e.downcast_ref::<std::io::Error>().is_some() {
                    "A file operation failed. Please try again."
                } else {
                    "An unexpected error occurred. Please try again."
                }
            }
        }
    }
}

/// Weather provider errors (HTTP, payload, upstream API).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a failure, either a non-2xx status or an
    /// `error` object in the body.
    #[error("Provider returned {status}: {}", .message.as_deref().unwrap_or(FALLBACK_PROVIDER_MESSAGE))]
    Api { status: u16, message: Option<String> },

    #[error("Connection failed: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProviderError {
    /// The message recorded in dashboard state: the provider's own error
    /// text when it sent one, otherwise [`FALLBACK_PROVIDER_MESSAGE`].
    pub fn message(&self) -> String {
        match self {
            ProviderError::Api {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            _ => FALLBACK_PROVIDER_MESSAGE.to_string(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::Api { status, .. } if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later."
            }
            ProviderError::Api { status: 401 | 403, .. } => {
                "Weather API key is invalid. Check settings."
            }
            ProviderError::Api { .. } => "Location not found. Check and try again.",
            ProviderError::Network(_) => "Unable to connect. Check your internet connection.",
            ProviderError::Timeout => "The request timed out. Please try again.",
            ProviderError::Parse(_) => "Received an unexpected response. Please try again.",
            ProviderError::Config(e) => e.user_message(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration directory not found. Check your environment.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

/// Rejected user input. Never stored as dashboard error state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Temperature range is invalid: [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },

    #[error("Coordinates out of range: {lat}, {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyQuery => "Enter a suburb to search.",
            ValidationError::InvalidRange { .. } => "Minimum temperature must not exceed maximum.",
            ValidationError::InvalidCoordinates { .. } => "Those coordinates are not on the map.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_provider_error(self) -> ProviderError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_provider_error(self) -> ProviderError {
        if self.is_timeout() {
            ProviderError::Timeout
        } else if self.is_decode() {
            ProviderError::Parse(self.to_string())
        } else if let Some(status) = self.status() {
            ProviderError::Api {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ProviderError::Network(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_is_verbatim() {
        let err = ProviderError::Api {
            status: 400,
            message: Some("No matching location found.".into()),
        };
        assert_eq!(err.message(), "No matching location found.");
    }

    #[test]
    fn test_provider_message_fallback() {
        let err = ProviderError::Api {
            status: 500,
            message: None,
        };
        assert_eq!(err.message(), FALLBACK_PROVIDER_MESSAGE);
        assert_eq!(ProviderError::Timeout.message(), FALLBACK_PROVIDER_MESSAGE);
        assert_eq!(
            ProviderError::Network("connection reset".into()).message(),
            FALLBACK_PROVIDER_MESSAGE
        );
    }

    #[test]
    fn test_blank_provider_message_uses_fallback() {
        let err = ProviderError::Api {
            status: 400,
            message: Some("  ".into()),
        };
        assert_eq!(err.message(), FALLBACK_PROVIDER_MESSAGE);
    }

    #[test]
    fn test_app_error_conversion() {
        let app_err: AppError = ValidationError::EmptyQuery.into();
        assert!(matches!(
            app_err,
            AppError::Validation(ValidationError::EmptyQuery)
        ));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Config(ConfigError::MissingSetting("api.api_key".into()));
        assert_eq!(
            app_err.user_message(),
            "A required setting is missing. Check your settings."
        );
        let app_err = AppError::Provider(ProviderError::Api {
            status: 401,
            message: None,
        });
        assert_eq!(
            app_err.user_message(),
            "Weather API key is invalid. Check settings."
        );
    }

    #[test]
    fn test_user_message_through_anyhow_context() {
        use anyhow::Context;

        let parse: anyhow::Result<()> = Err::<(), _>(ConfigError::ParseError("expected `]`".into()))
            .context("Failed to parse config file");
        let app_err = AppError::from(parse.unwrap_err());
        assert_eq!(
            app_err.user_message(),
            "Configuration file is malformed. Check your settings."
        );
        assert!(app_err.to_string().contains("expected `]`"));

        let io: anyhow::Result<()> = Err::<(), _>(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ))
        .context("Failed to write config file");
        assert_eq!(
            AppError::from(io.unwrap_err()).user_message(),
            "A file operation failed. Please try again."
        );

        let other = AppError::from(anyhow::anyhow!("subscriber already set"));
        assert_eq!(
            other.user_message(),
            "An unexpected error occurred. Please try again."
        );
    }
}
