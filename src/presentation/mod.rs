// Presentation layer - HTTP routes
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    api_overview, api_performance, api_targets, artifact, health_check, home, map, overview,
    performance, story,
};
use axum::{Router, routing::get};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/", get(home))
        .route("/overview", get(overview))
        .route("/api/overview", get(api_overview))
        .route("/performance", get(performance))
        .route("/api/performance", get(api_performance))
        .route("/story/:chapter", get(story))
        .route("/map", get(map))
        .route("/artifacts/:name", get(artifact))
        .route("/api/targets", get(api_targets))
        .with_state(state)
}
