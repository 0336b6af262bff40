//! OneThing server
//!
//! Relays morning briefing turns to the text-generation service and exposes
//! the task store over a small JSON API.

pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/briefing", post(routes::briefing::relay_briefing))
        .route(
            "/api/briefing/complete",
            post(routes::briefing::complete_briefing),
        )
        .route("/api/briefing/today", get(routes::briefing::todays_briefing))
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/api/tasks/:id", axum::routing::delete(routes::tasks::delete_task))
        .route("/api/tasks/:id/toggle", post(routes::tasks::toggle_task))
        .route("/api/tasks/:id/tier", put(routes::tasks::update_tier))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
