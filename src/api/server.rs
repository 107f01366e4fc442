use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::{services, state::AppState};
use crate::config::Config;
use crate::handlers::Registry;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All registry routes over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/handlers",
            get(services::list_handlers).post(services::register_handler),
        )
        .route(
            "/handlers/{id}",
            get(services::get_handler).delete(services::unregister_handler),
        )
        .route("/handlers/{id}/fields/{field}", get(services::get_array_field))
        .route("/search", get(services::search))
        .route("/values/{field}", get(services::list_values))
        .route("/conflicts/{id}", get(services::conflicts))
        .route(
            "/owners/{owner}/handlers",
            get(services::owner_handlers).delete(services::unregister_owner),
        )
        .route("/resolve", get(services::resolve))
        .route("/metrics", get(services::metrics))
        .route("/health", get(services::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let address: SocketAddr = config.server.bind_addr;

    info!(backend = ?config.store.backend, path = %config.store.path.display(), "Opening handler store");
    let store = config
        .store
        .open()
        .map_err(|e| format!("Failed to open handler store: {}", e))?;
    let registry = Arc::new(Registry::open(store).await?);

    let app = router(AppState::new(config, registry.clone()));

    let listener = TcpListener::bind(address).await?;
    info!(%address, "Handler registry listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
