//! End-to-end dashboard tests: HTTP client against a mock provider, store,
//! and map view.

use capeweather_core::{ApiConfig, RegionConfig};
use capeweather_provider::WeatherClient;
use capeweather_store::{
    Dashboard, FetchOutcome, MapLayers, MapView, RegionGate, TemperatureRange,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn location(name: &str, region: &str, temp_c: f64, condition: &str) -> serde_json::Value {
    serde_json::json!({
        "location": { "name": name, "region": region, "country": "South Africa",
                      "lat": -33.9, "lon": 18.5 },
        "current": { "temp_c": temp_c, "feelslike_c": temp_c, "humidity": 60,
                     "wind_kph": 20.0, "precip_mm": 0.0,
                     "condition": { "text": condition,
                                    "icon": "//cdn.weatherapi.com/weather/64x64/day/113.png" } }
    })
}

async fn mount(server: &MockServer, query: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn dashboard(server: &MockServer, gate: RegionGate) -> Dashboard<WeatherClient> {
    let client = WeatherClient::new(&ApiConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
    })
    .unwrap();
    Dashboard::new(client, gate)
}

#[tokio::test]
async fn test_search_then_refresh_replaces_record() {
    let server = MockServer::start().await;
    mount(
        &server,
        "Rondebosch",
        location("Rondebosch", "Western Cape", 18.0, "Sunny"),
    )
    .await;
    mount(
        &server,
        "rondebosch",
        location("Rondebosch", "Western Cape", 24.0, "Partly cloudy"),
    )
    .await;

    let dash = dashboard(&server, RegionGate::open());
    dash.request_fetch("Rondebosch").await.unwrap();
    dash.request_fetch("rondebosch").await.unwrap();

    let state = dash.store().snapshot();
    assert_eq!(state.locations().len(), 1);
    assert_eq!(state.locations()[0].current.temperature_c, 24.0);
    assert_eq!(state.locations()[0].current.condition_text, "Partly cloudy");
}

#[tokio::test]
async fn test_provider_error_lands_in_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 1006, "message": "No matching location found." }
        })))
        .mount(&server)
        .await;

    let dash = dashboard(&server, RegionGate::open());
    let outcome = dash.request_fetch("Atlantis Dunes").await.unwrap();

    assert_eq!(
        outcome,
        FetchOutcome::Rejected("No matching location found.".to_string())
    );
    let state = dash.store().snapshot();
    assert!(state.locations().is_empty());
    assert!(state.current().is_none());
    assert_eq!(state.error(), Some("No matching location found."));
}

#[tokio::test]
async fn test_seed_defaults_with_region_gate_and_map_filter() {
    let server = MockServer::start().await;
    mount(
        &server,
        "Muizenberg",
        location("Muizenberg", "Western Cape", 19.0, "Light rain"),
    )
    .await;
    mount(
        &server,
        "Durbanville",
        location("Durbanville", "Western Cape", 33.0, "Sunny"),
    )
    .await;
    mount(
        &server,
        "Parklands",
        location("Parklands", "Gauteng", 21.0, "Sunny"),
    )
    .await;

    let gate = RegionGate::from_config(&RegionConfig::default());
    let dash = dashboard(&server, gate);

    let suburbs = vec![
        "Muizenberg".to_string(),
        "Durbanville".to_string(),
        "Parklands".to_string(),
    ];
    let outcome = dash.seed_defaults(&suburbs).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Applied);

    let state = dash.store().snapshot();
    let names: Vec<_> = state.locations().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Muizenberg", "Durbanville"]);

    let view = MapView::derive(
        &state,
        &TemperatureRange::new(0.0, 30.0).unwrap(),
        &MapLayers::all(),
    );
    assert_eq!(view.visible.len(), 1);
    assert_eq!(view.visible[0].name, "Muizenberg");
    assert_eq!(view.heat.len(), 1);
    assert_eq!(view.heat[0].intensity, 19.0);
}
