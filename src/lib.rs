pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod views;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::db::AppState;

/// The full application: operator pages, login and health.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::router())
        .merge(handlers::session::router())
        .merge(handlers::operators::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
