use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    Router::new()
        .route("/", post(handler::create_job).get(handler::list_jobs))
        .route("/{id}", get(handler::get_job).delete(handler::delete_job))
        .route("/{id}/files", get(handler::list_job_files))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}

pub fn queue_router(state: AppState) -> axum::Router<AppState> {
    let admin_routes = Router::new()
        .route("/", post(handler::create_queue))
        .route_layer(middleware::from_fn(crate::middleware::role::admin_guard));

    Router::new()
        .route("/", get(handler::list_queues))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
