//! beacon-server: device telemetry relay
//!
//! Devices POST status updates to `/update`; browsers authenticate on `/`
//! and receive every change as a full snapshot over `/ws`.

pub mod broadcast;
pub mod gateway;
pub mod handlers;
pub mod registry;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use state::{AppState, SharedState};

/// Build the relay router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard_handler))
        .route("/update", post(handlers::update_handler))
        .route("/ws", get(handlers::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
