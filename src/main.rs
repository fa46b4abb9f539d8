use std::sync::Arc;

use anyhow::Result;

use country_exchange_backend::config::Config;
use country_exchange_backend::logging;
use country_exchange_backend::module::country::{
    CountryFetcher, CountryStore, RefreshService, UniformMultiplier,
};
use country_exchange_backend::module::renderer::SummaryRenderer;
use country_exchange_backend::service::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load("config.toml")?;

    // Initialize logging
    let _logging_guard = logging::init_logging("logs", "country-exchange", &config.log_level);

    tracing::info!("Country exchange backend starting...");

    // Connect the store and create the schema
    let store = CountryStore::connect(&config.database_url).await?;
    tracing::info!("Connected to database at {}", config.database_url);

    let fetcher = CountryFetcher::new(&config.countries_api_url, &config.exchange_rate_api_url);
    let renderer = SummaryRenderer::new(&config.cache_dir);
    let image_path = renderer.output_path();

    let refresh = RefreshService::new(
        fetcher,
        store.clone(),
        renderer,
        Box::new(UniformMultiplier::new()),
    );

    let state = Arc::new(AppState {
        store,
        refresh,
        image_path,
    });
    let app = service::build_router(state);

    let addr = config.server_address();
    tracing::info!("HTTP server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
