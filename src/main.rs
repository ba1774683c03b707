use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marine_screen::adapters::{InMemorySettings, NtpClient, SystemDeviceClock, WindGuruClient};
use marine_screen::application::{PreciseTimeProvider, StationService};
use marine_screen::config::{load_settings, Config};
use marine_screen::domain::StationSettings;
use marine_screen::interface::http::create_router;
use marine_screen::ports::SettingsSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("marine_screen={},tower_http=info", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Marine Screen v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let initial = match &config.settings_path {
        Some(path) => match load_settings(path) {
            Ok(settings) => {
                info!("✓ Loaded station settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("⚠ {}. Starting without a station.", e);
                StationSettings::default()
            }
        },
        None => {
            info!("No settings file configured, starting without a station");
            StationSettings::default()
        }
    };
    let settings = Arc::new(InMemorySettings::new(initial));

    // Time provider
    let time_provider = Arc::new(PreciseTimeProvider::new(
        config.time.clone(),
        Arc::new(SystemDeviceClock),
    ));
    let ntp = NtpClient::new(config.ntp_servers.clone(), config.ntp_timeout);
    let time_task = time_provider.spawn(Arc::new(ntp));
    info!("✓ Time sync started against {:?}", config.ntp_servers);

    // Station engine
    let client = WindGuruClient::new(config.station_endpoint.clone(), config.station_timeout)?;
    let station_service = Arc::new(StationService::new(
        config.engine.clone(),
        Arc::clone(&time_provider),
        Arc::new(client),
    ));
    let station_task = tokio::spawn(Arc::clone(&station_service).run(settings.subscribe()));
    info!("✓ Station service initialized");

    // Create HTTP server
    let app = create_router(station_service, Arc::clone(&time_provider), settings);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ Marine Screen listening on {}", addr);
    info!("  → API: http://localhost:{}/api/station", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    station_task.abort();
    time_task.abort();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
