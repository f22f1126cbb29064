use std::process::ExitCode;

use capeweather_core::{AppError, Config};
use capeweather_provider::WeatherClient;
use capeweather_store::{
    ClusterSize, Dashboard, MapLayers, MapView, RegionGate, TemperatureRange,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    capeweather_core::init()?;

    let (config, _) = Config::load_validated()?;
    let client = WeatherClient::new(&config.api)?;
    let dashboard = Dashboard::new(client, RegionGate::from_config(&config.region));
    let range = TemperatureRange::from_config(&config.map)?;
    let layers = MapLayers::from_config(&config.map);

    tracing::info!("CapeWeather dashboard started");

    if config.dashboard.seed_on_start {
        if let Err(e) = dashboard
            .seed_defaults(&config.dashboard.default_suburbs)
            .await
        {
            tracing::warn!("Skipping seed: {}", e);
        }
    }

    let state = dashboard.store().snapshot();
    if let Some(error) = state.error() {
        println!("Error: {}", error);
    }

    let view = MapView::derive(&state, &range, &layers);
    println!("CapeWeather - Cape Town suburbs");
    println!(
        "{} locations, {} in range [{}, {}] °C, cluster size {:?}",
        state.locations().len(),
        view.visible.len(),
        range.min(),
        range.max(),
        ClusterSize::for_count(view.markers.len()),
    );
    for loc in &view.visible {
        println!(
            "  {:<16} {:>5.1}°C  {:<24} humidity {}%  wind {} kph",
            loc.name,
            loc.current.temperature_c,
            loc.current.condition_text,
            loc.current.humidity_pct,
            loc.current.wind_kph
        );
    }
    if !view.heat.is_empty() {
        println!("Heat layer: {} points", view.heat.len());
    }
    if !view.legend.is_empty() {
        let entries: Vec<_> = view
            .legend
            .iter()
            .map(|e| format!("{} ({})", e.label, e.icon))
            .collect();
        println!("Legend: {}", entries.join(", "));
    }

    Ok(())
}
