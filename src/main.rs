// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;

use crate::application::allocation_service::AllocationService;
use crate::application::dashboard_store::DashboardStore;
use crate::application::planner::AllocationPlanner;
use crate::domain::widget::WidgetBuilder;
use crate::infrastructure::config::{load_allocator_config, StoreBackend};
use crate::infrastructure::http_store::HttpDashboardStore;
use crate::infrastructure::memory_store::MemoryDashboardStore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, volume_batch, volume_event};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_allocator_config()?;

    // Create store (infrastructure layer)
    let store: Arc<dyn DashboardStore> = match config.store.backend {
        StoreBackend::Http => Arc::new(HttpDashboardStore::new(
            config.store.base_url.clone(),
            config.store.token.clone(),
        )),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory dashboard store, nothing is persisted");
            Arc::new(MemoryDashboardStore::new())
        }
    };

    // Create services (application layer)
    let planner = AllocationPlanner::new(config.limits, WidgetBuilder::new(config.widget.clone()));
    let allocation_service = AllocationService::new(store, planner, config.allocation_settings());

    // Create application state
    let state = Arc::new(AppState { allocation_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/events/volume", post(volume_event))
        .route("/events/batch", post(volume_batch))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.listen_addr.parse()?;
    tracing::info!(
        "Starting volume-dashboard-allocator on {} (prefix {})",
        addr,
        config.dashboard.prefix
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
