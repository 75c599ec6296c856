use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::health;
use super::resources;
use super::state::AppState;

/// Create a minimal router without state (liveness probes only)
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .layer(TraceLayer::new_for_http())
}

/// Create the full router with application state.
///
/// Static routes win over the `{resource}` captures, so the health and
/// ping endpoints stay reachable whatever resource kinds are configured.
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .route("/__ping/cache", get(resources::cache_ping))
        .route(
            "/{resource}",
            get(resources::list_documents).post(resources::create_document),
        )
        .route(
            "/{resource}/{id}",
            get(resources::get_document)
                .put(resources::update_document)
                .delete(resources::delete_document),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
