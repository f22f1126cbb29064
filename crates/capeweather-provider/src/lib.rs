//! Weather provider client for CapeWeather
//!
//! Fetches current conditions (and optionally an hourly forecast) for a
//! place name or coordinate pair and normalizes them into `LocationRecord`s.

pub mod provider;
pub mod types;

pub use provider::{WeatherClient, WeatherSource};
pub use types::*;
