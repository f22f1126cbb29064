//! HTTP client for the weather provider (WeatherAPI-compatible JSON API).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use capeweather_core::{ApiConfig, ProviderError, ReqwestErrorExt};
use chrono::NaiveDateTime;
use futures::future::try_join_all;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{
    coords_query, normalize_icon_ref, Coordinates, CurrentConditions, ForecastPoint,
    LocationRecord,
};

const FORECAST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Anything that can turn a location query into weather records.
///
/// The dashboard store is driven through this trait so it can be fed by the
/// HTTP client or by an in-memory source.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions for a place name or `"lat,lon"` query.
    async fn fetch_one(&self, query: &str) -> Result<LocationRecord, ProviderError>;

    /// Current conditions plus an hourly temperature series.
    async fn fetch_forecast(&self, query: &str, days: u8)
        -> Result<LocationRecord, ProviderError>;

    async fn fetch_one_by_coords(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<LocationRecord, ProviderError> {
        self.fetch_one(&coords_query(lat, lon)).await
    }

    /// All queries concurrently. Fails as a whole if any request fails;
    /// results are in query order.
    async fn fetch_many(&self, queries: &[String]) -> Result<Vec<LocationRecord>, ProviderError> {
        try_join_all(queries.iter().map(|q| self.fetch_one(q))).await
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    location: ApiLocation,
    current: ApiCurrent,
    #[serde(default)]
    forecast: Option<ApiForecast>,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: f64,
    wind_kph: f64,
    #[serde(default)]
    precip_mm: f64,
    condition: ApiCondition,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    #[serde(default)]
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ApiForecast {
    #[serde(default)]
    forecastday: Vec<ApiForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastDay {
    #[serde(default)]
    hour: Vec<ApiForecastHour>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastHour {
    time: String,
    temp_c: f64,
}

impl ApiResponse {
    fn into_record(self) -> LocationRecord {
        let coordinates = match (self.location.lat, self.location.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        };

        let forecast = self.forecast.map(|f| {
            f.forecastday
                .into_iter()
                .flat_map(|day| day.hour)
                .filter_map(|h| {
                    match NaiveDateTime::parse_from_str(&h.time, FORECAST_TIME_FORMAT) {
                        Ok(time) => Some(ForecastPoint {
                            time,
                            temperature_c: h.temp_c,
                        }),
                        Err(e) => {
                            tracing::debug!("Skipping forecast hour {:?}: {}", h.time, e);
                            None
                        }
                    }
                })
                .collect()
        });

        LocationRecord {
            name: self.location.name,
            region: self.location.region,
            country: self.location.country,
            coordinates,
            current: CurrentConditions {
                temperature_c: self.current.temp_c,
                feels_like_c: self.current.feelslike_c,
                humidity_pct: self.current.humidity.round().clamp(0.0, 100.0) as u8,
                wind_kph: self.current.wind_kph,
                precipitation_mm: self.current.precip_mm,
                condition_text: self.current.condition.text,
                condition_icon_ref: normalize_icon_ref(&self.current.condition.icon),
            },
            forecast,
        }
    }
}

/// Weather provider HTTP client. One attempt per request, no retries.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    /// Build a client from config. Fails fast when no API key is configured.
    pub fn new(config: &ApiConfig) -> Result<Self, ProviderError> {
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ReqwestErrorExt::into_provider_error)?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(ReqwestErrorExt::into_provider_error)?;

        self.handle_response(response).await
    }

    /// Map a provider response to a payload or a `ProviderError`.
    ///
    /// The provider reports failures as `{"error": {"code", "message"}}`,
    /// usually with a 4xx status. An error object wins even on a 2xx.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(ReqwestErrorExt::into_provider_error)?;

        if let Ok(ApiErrorEnvelope { error: Some(err) }) = serde_json::from_str(&body) {
            tracing::warn!(
                "Weather provider error ({}): {}",
                status,
                err.message.as_deref().unwrap_or("<no message>")
            );
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: err.message,
            });
        }

        if !status.is_success() {
            tracing::warn!("Weather provider returned status {}", status);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch_one(&self, query: &str) -> Result<LocationRecord, ProviderError> {
        let resp: ApiResponse = self
            .get("current.json", &[("q", query), ("aqi", "no")])
            .await?;
        let record = resp.into_record();
        tracing::debug!(
            "Fetched {} ({}): {}°C",
            record.name,
            record.region,
            record.current.temperature_c
        );
        Ok(record)
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast(
        &self,
        query: &str,
        days: u8,
    ) -> Result<LocationRecord, ProviderError> {
        let days = days.clamp(1, 14).to_string();
        let resp: ApiResponse = self
            .get(
                "forecast.json",
                &[("q", query), ("days", days.as_str()), ("aqi", "no"), ("alerts", "no")],
            )
            .await?;
        Ok(resp.into_record())
    }
}
