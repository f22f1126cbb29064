//! Map view derivations: temperature filter, heat layer input, markers,
//! cluster sizing and the legend.
//!
//! Everything here is a pure function of the location list and the
//! user-selected temperature range.

use capeweather_core::{MapConfig, ValidationError};
use capeweather_provider::{ConditionCategory, Coordinates, LocationRecord};

use crate::state::WeatherState;

/// Closed temperature interval in °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRange {
    min: f64,
    max: f64,
}

impl TemperatureRange {
    pub const DEFAULT_MIN: f64 = -10.0;
    pub const DEFAULT_MAX: f64 = 40.0;

    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ValidationError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn from_config(config: &MapConfig) -> Result<Self, ValidationError> {
        Self::new(config.min_temp_c, config.max_temp_c)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, temperature_c: f64) -> bool {
        temperature_c >= self.min && temperature_c <= self.max
    }
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

/// `(lat, lon, temperature)` input for the heat layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

/// Records whose current temperature lies in `range`, in list order.
pub fn visible_locations<'a>(
    locations: &'a [LocationRecord],
    range: &TemperatureRange,
) -> Vec<&'a LocationRecord> {
    locations
        .iter()
        .filter(|loc| range.contains(loc.current.temperature_c))
        .collect()
}

/// Heat layer points for the records that have coordinates.
pub fn heat_points(visible: &[&LocationRecord]) -> Vec<HeatPoint> {
    visible
        .iter()
        .filter_map(|loc| {
            loc.coordinates.map(|c| HeatPoint {
                lat: c.lat,
                lon: c.lon,
                intensity: loc.current.temperature_c,
            })
        })
        .collect()
}

/// A marker popup's worth of data.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub name: String,
    pub position: Coordinates,
    pub category: ConditionCategory,
    pub temperature_c: f64,
    pub condition_text: String,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub has_forecast: bool,
}

impl MapMarker {
    fn from_record(record: &LocationRecord) -> Option<Self> {
        let position = record.coordinates?;
        Some(Self {
            name: record.name.clone(),
            position,
            category: record.current.category(),
            temperature_c: record.current.temperature_c,
            condition_text: record.current.condition_text.clone(),
            humidity_pct: record.current.humidity_pct,
            wind_kph: record.current.wind_kph,
            has_forecast: record.forecast.as_ref().is_some_and(|f| !f.is_empty()),
        })
    }
}

/// Optional overlays the user can switch on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapLayers {
    pub show_heatmap: bool,
    pub show_legend: bool,
}

impl MapLayers {
    pub fn all() -> Self {
        Self {
            show_heatmap: true,
            show_legend: true,
        }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            show_heatmap: config.show_heatmap,
            show_legend: config.show_legend,
        }
    }
}

impl Default for MapLayers {
    fn default() -> Self {
        Self::from_config(&MapConfig::default())
    }
}

/// Everything the map needs for one render. `heat` and `legend` are empty
/// when their layer is switched off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapView {
    pub visible: Vec<LocationRecord>,
    pub markers: Vec<MapMarker>,
    pub heat: Vec<HeatPoint>,
    pub legend: Vec<LegendEntry>,
}

impl MapView {
    pub fn derive(state: &WeatherState, range: &TemperatureRange, layers: &MapLayers) -> Self {
        let visible = visible_locations(state.locations(), range);
        let heat = if layers.show_heatmap {
            heat_points(&visible)
        } else {
            Vec::new()
        };
        let markers = visible
            .iter()
            .filter_map(|r| MapMarker::from_record(r))
            .collect();

        Self {
            visible: visible.into_iter().cloned().collect(),
            markers,
            heat,
            legend: if layers.show_legend { legend() } else { Vec::new() },
        }
    }
}

/// Marker cluster bucket by member count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterSize {
    /// Fewer than 10 markers.
    Small,
    /// 10 to 99 markers.
    Medium,
    /// 100 or more.
    Large,
}

impl ClusterSize {
    pub fn for_count(count: usize) -> Self {
        match count {
            0..=9 => Self::Small,
            10..=99 => Self::Medium,
            _ => Self::Large,
        }
    }

    /// CSS class for the cluster icon
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Small => "cluster-small",
            Self::Medium => "cluster-medium",
            Self::Large => "cluster-large",
        }
    }
}

/// One legend row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    pub label: &'static str,
    pub icon: &'static str,
}

pub fn legend() -> Vec<LegendEntry> {
    ConditionCategory::ALL
        .iter()
        .map(|c| LegendEntry {
            label: c.description(),
            icon: c.icon_name(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::record;
    use crate::state::{Action, RegionGate};

    #[test]
    fn default_range_matches_slider() {
        let range = TemperatureRange::default();
        assert_eq!(range.min(), -10.0);
        assert_eq!(range.max(), 40.0);
    }

    #[test]
    fn range_rejects_inverted_and_nan() {
        assert!(TemperatureRange::new(5.0, 1.0).is_err());
        assert!(TemperatureRange::new(f64::NAN, 1.0).is_err());
        assert!(TemperatureRange::new(3.0, 3.0).is_ok());
    }

    #[test]
    fn range_is_closed() {
        let range = TemperatureRange::new(0.0, 30.0).unwrap();
        assert!(range.contains(0.0));
        assert!(range.contains(30.0));
        assert!(!range.contains(30.1));
        assert!(!range.contains(-0.1));
    }

    #[test]
    fn filter_keeps_in_range_records() {
        let locations = vec![
            record("Cold", -5.0),
            record("Mild", 10.0),
            record("Warm", 25.0),
            record("Hot", 42.0),
        ];
        let range = TemperatureRange::new(0.0, 30.0).unwrap();

        let visible = visible_locations(&locations, &range);
        let names: Vec<_> = visible.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Mild", "Warm"]);
    }

    #[test]
    fn heat_points_skip_records_without_coordinates() {
        let mut no_coords = record("Atlantis", 20.0);
        no_coords.coordinates = None;
        let with_coords = record("Bellville", 25.0);

        let visible = vec![&no_coords, &with_coords];
        let heat = heat_points(&visible);

        assert_eq!(
            heat,
            vec![HeatPoint {
                lat: -33.9,
                lon: 18.4,
                intensity: 25.0
            }]
        );
    }

    #[test]
    fn map_view_from_state() {
        let mut state = WeatherState::new();
        let mut rainy = record("Newlands", 14.0);
        rainy.current.condition_text = "Light rain".to_string();
        state.apply(
            Action::BulkFulfilled {
                generation: 0,
                records: vec![rainy, record("Bellville", 35.0)],
            },
            &RegionGate::open(),
        );

        let view = MapView::derive(
            &state,
            &TemperatureRange::new(0.0, 30.0).unwrap(),
            &MapLayers::all(),
        );
        assert_eq!(view.visible.len(), 1);
        assert_eq!(view.heat.len(), 1);
        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.markers[0].category, ConditionCategory::Rainy);
        assert!(!view.markers[0].has_forecast);
        assert_eq!(view.legend.len(), 6);
    }

    #[test]
    fn hidden_layers_are_left_empty() {
        let mut state = WeatherState::new();
        state.apply(
            Action::BulkFulfilled {
                generation: 0,
                records: vec![record("Newlands", 14.0)],
            },
            &RegionGate::open(),
        );
        let layers = MapLayers {
            show_heatmap: false,
            show_legend: false,
        };

        let view = MapView::derive(&state, &TemperatureRange::default(), &layers);
        assert_eq!(view.visible.len(), 1);
        assert_eq!(view.markers.len(), 1);
        assert!(view.heat.is_empty());
        assert!(view.legend.is_empty());
    }

    #[test]
    fn layers_follow_config() {
        let mut config = MapConfig::default();
        assert_eq!(
            MapLayers::from_config(&config),
            MapLayers {
                show_heatmap: false,
                show_legend: true,
            }
        );

        config.show_heatmap = true;
        config.show_legend = false;
        let layers = MapLayers::from_config(&config);
        assert!(layers.show_heatmap);
        assert!(!layers.show_legend);
    }

    #[test]
    fn cluster_buckets() {
        assert_eq!(ClusterSize::for_count(1), ClusterSize::Small);
        assert_eq!(ClusterSize::for_count(9), ClusterSize::Small);
        assert_eq!(ClusterSize::for_count(10), ClusterSize::Medium);
        assert_eq!(ClusterSize::for_count(99), ClusterSize::Medium);
        assert_eq!(ClusterSize::for_count(100), ClusterSize::Large);
        assert_eq!(ClusterSize::Medium.css_class(), "cluster-medium");
    }

    #[test]
    fn legend_lists_every_category() {
        let entries = legend();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0].label, "Sunny");
        assert_eq!(entries[5].label, "Stormy");
    }
}
