use std::sync::Arc;

use engine_core::{discover, Coordinator, DefaultHardwareProbe, EngineManager, ReloadManager, Registry, SettingsStore, StatePublisher};
use engine_service::config::Config;
use engine_service::state::AppState;
use engine_service::{build_router, catalog};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn print_version() {
    println!("engine-service {}", env!("CARGO_PKG_VERSION"));
    println!("commit: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().map_err(|err| format!("failed to load configuration: {err}"))?;

    let registry = Arc::new(Registry::new());
    let probe = DefaultHardwareProbe;
    let catalog = catalog::builtin_catalog(&config.runners);
    let reports = discover(&catalog, &probe, &registry).await;
    for report in &reports {
        tracing::info!(runner = %report.name, outcome = ?report.outcome, "discovery");
    }

    let manager = Arc::new(EngineManager::new(registry));
    let settings_store = Arc::new(SettingsStore::new(config.settings_path.clone()));
    let reload = Arc::new(ReloadManager::new(manager.clone(), settings_store));
    reload
        .load_initial()
        .await
        .map_err(|err| format!("failed to load persisted settings: {err}"))?;

    let state_publisher = Arc::new(StatePublisher::new());
    let coordinator = Arc::new(Coordinator::new(manager, state_publisher.clone()));

    let app_state = Arc::new(AppState::new(config.clone(), coordinator, reload, state_publisher));

    let app = build_router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    tracing::info!(%addr, "starting engine-service");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
