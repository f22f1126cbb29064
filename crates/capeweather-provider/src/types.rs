use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Weather condition categories used for map markers and the legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    #[default]
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Smog,
    Stormy,
}

impl ConditionCategory {
    /// Every category, in legend order.
    pub const ALL: [ConditionCategory; 6] = [
        Self::Sunny,
        Self::Cloudy,
        Self::Rainy,
        Self::Snowy,
        Self::Smog,
        Self::Stormy,
    ];

    /// Classify the provider's free-text condition ("Patchy light rain",
    /// "Overcast", ...). Unrecognised text falls back to sunny.
    pub fn from_condition_text(text: &str) -> Self {
        let text = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if has(&["thunder", "storm", "lightning"]) {
            Self::Stormy
        } else if has(&["snow", "sleet", "blizzard", "ice", "hail"]) {
            Self::Snowy
        } else if has(&["rain", "drizzle", "shower"]) {
            Self::Rainy
        } else if has(&["fog", "mist", "smog", "haze", "smoke", "dust"]) {
            Self::Smog
        } else if has(&["cloud", "overcast"]) {
            Self::Cloudy
        } else {
            Self::Sunny
        }
    }

    /// Legend label
    pub fn description(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::Cloudy => "Cloudy",
            Self::Rainy => "Rainy",
            Self::Snowy => "Snowy",
            Self::Smog => "Smog",
            Self::Stormy => "Stormy",
        }
    }

    /// Icon name for the presentation layer
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Sunny => "sun",
            Self::Cloudy => "cloud",
            Self::Rainy => "cloud_rain",
            Self::Snowy => "snowflake",
            Self::Smog => "smog",
            Self::Stormy => "bolt",
        }
    }
}

/// Geographic position of a location record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub precipitation_mm: f64,
    pub condition_text: String,
    /// Absolute icon URL
    pub condition_icon_ref: String,
}

impl CurrentConditions {
    pub fn category(&self) -> ConditionCategory {
        ConditionCategory::from_condition_text(&self.condition_text)
    }
}

/// One point of an hourly temperature series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: NaiveDateTime,
    pub temperature_c: f64,
}

/// One weather observation for a named place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub country: String,
    pub coordinates: Option<Coordinates>,
    pub current: CurrentConditions,
    #[serde(default)]
    pub forecast: Option<Vec<ForecastPoint>>,
}

impl LocationRecord {
    /// Case-insensitive name comparison, the dedup key of the location list.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Case-insensitive region containment.
    pub fn in_region(&self, region_substring: &str) -> bool {
        self.region
            .to_lowercase()
            .contains(&region_substring.to_lowercase())
    }
}

/// Format coordinates as a provider query string (`"lat,lon"`).
pub fn coords_query(lat: f64, lon: f64) -> String {
    format!("{},{}", lat, lon)
}

/// Provider icon refs are protocol-relative (`//cdn.weatherapi.com/...`).
pub fn normalize_icon_ref(icon: &str) -> String {
    if icon.starts_with("//") {
        format!("https:{}", icon)
    } else {
        icon.to_string()
    }
}
