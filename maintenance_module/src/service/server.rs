use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tokio::task;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::scheduler::{PostmarkNotifier, SqliteMaintenanceStore};

use super::config::ServiceConfig;
use super::routes;
use super::state::AppState;
use super::BoxError;

pub async fn run_server(
    config: ServiceConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), BoxError> {
    let db_path = config.maintenance_db_path.clone();
    let store = Arc::new(
        task::spawn_blocking(move || SqliteMaintenanceStore::new(db_path))
            .await
            .map_err(|err| -> BoxError { err.into() })??,
    );
    let state = AppState {
        config: Arc::new(config),
        store,
        notifier: Arc::new(PostmarkNotifier),
    };

    let host: IpAddr = state
        .config
        .host
        .parse()
        .map_err(|_| format!("invalid host: {}", state.config.host))?;
    let addr = SocketAddr::new(host, state.config.port);

    let app = Router::new()
        .route("/", get(routes::health))
        .route("/health", get(routes::health))
        .route(
            "/scheduler/sites",
            post(routes::save_site).get(routes::list_sites),
        )
        .route(
            "/scheduler/sites/:id",
            get(routes::get_site).delete(routes::remove_site),
        )
        .route("/scheduler/bulk-rebuild", post(routes::bulk_rebuild_sites))
        .route("/scheduler/maintenance", get(routes::list_maintenance))
        .route(
            "/scheduler/maintenance/status",
            patch(routes::set_item_status),
        )
        .route("/scheduler/overview", get(routes::overview_summary))
        .route("/changelogs", post(routes::ingest_changelog))
        .route("/changelogs/latest", get(routes::latest_changelog))
        .with_state(state)
        .layer(CorsLayer::permissive());

    info!("maintenance service listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
