// src/bin/api_server.rs

use restaurant_discovery::infra::{db, telemetry};
use restaurant_discovery::transport;
use restaurant_discovery::{
    AppConfig, CsvExportSink, PgRestaurantStore, RecalculationPipeline, RestaurantService,
    RestaurantStore, Strategy,
};
use std::sync::Arc;
use tokio::sync::Notify;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    telemetry::init(config.log_format);
    info!(bind_addr = %config.bind_addr, "Configuration loaded");

    // --- Storage ---
    let pool = db::connect(&config).await?;
    let store: Arc<dyn RestaurantStore> = Arc::new(PgRestaurantStore::new(pool));

    // --- Services ---
    let service = RestaurantService::new(Arc::clone(&store));
    let pipeline = Arc::new(RecalculationPipeline::new(
        Arc::clone(&store),
        CsvExportSink::new(&config.export_path),
        config.recalc_workers,
    ));

    let shutdown = Arc::new(Notify::new());
    let periodic = config.recalc_interval.map(|every| {
        info!(interval_secs = every.as_secs(), "Periodic recalculation enabled");
        Arc::clone(&pipeline).spawn_periodic(every, Strategy::Workers, Arc::clone(&shutdown))
    });

    let app_state = transport::http::AppState {
        service,
        pipeline,
    };

    // --- API Server ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("API server listening on http://{}", config.bind_addr);
    info!("Swagger UI available at http://{}/swagger-ui", config.bind_addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!(error = %e, "API server stopped with an error");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received (Ctrl+C)");
        }
    }

    if let Some(handle) = periodic {
        shutdown.notify_one();
        if let Err(e) = handle.await {
            error!(error = %e, "Periodic recalculation task ended abnormally");
        }
    }
    info!("Graceful shutdown complete");
    Ok(())
}
