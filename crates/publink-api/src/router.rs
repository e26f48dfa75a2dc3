//! Route definitions for the Publink HTTP surface.
//!
//! Two route families: the keyed share-creation API under `/api`, and
//! the anonymous share-access routes under `/s/`. The router receives
//! `AppState` and passes it to all handlers via Axum's `State`
//! extractor.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/shares", post(handlers::share::create_share))
        .route("/health", get(handlers::health::health_check));

    Router::new()
        .nest("/api", api_routes)
        .route(
            "/s/*path",
            get(handlers::public::access_share).post(handlers::public::verify_password),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
