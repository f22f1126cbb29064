//! Dashboard state for CapeWeather
//!
//! Accumulates fetched location records under a replace-in-place dedup
//! policy and derives the map view from them.

pub mod dashboard;
pub mod map;
pub mod state;
pub mod store;

pub use dashboard::{Dashboard, FetchOutcome};
pub use map::{
    heat_points, legend, visible_locations, ClusterSize, HeatPoint, LegendEntry, MapLayers,
    MapMarker, MapView, TemperatureRange,
};
pub use state::{
    request_key, Action, FetchStatus, Generation, RegionGate, RequestId, WeatherState,
};
pub use store::WeatherStore;
