mod app;
mod codec;
mod config;
mod controller;
mod effect;
mod error;
mod gemini;
mod picker;
mod view;

use std::sync::Arc;

use app::EffectsApp;
use config::{ApiConfig, AppConfig};
use gemini::GeminiClient;

fn resolve_api_config(config: &AppConfig) -> ApiConfig {
    match ApiConfig::from_env(config) {
        Ok(api) => api,
        Err(err) => {
            tracing::error!(%err, "startup configuration invalid");
            eprintln!("image-effects: {}", err);
            std::process::exit(2);
        }
    }
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let api = resolve_api_config(&config);
    tracing::info!(model = %api.model, endpoint = %api.endpoint, "using AI service");

    let client = match GeminiClient::new(api) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("image-effects: could not create HTTP client: {}", err);
            std::process::exit(2);
        }
    };

    let width = config.window_width.unwrap_or(1100.0);
    let height = config.window_height.unwrap_or(820.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Image Effects AI")
            .with_app_id("image-effects")
            .with_drag_and_drop(true)
            .with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "image-effects",
        native_options,
        Box::new(|cc| Ok(Box::new(EffectsApp::new(cc, config, Arc::new(client))))),
    )
}
