use axum::Router;
use axum::routing::{get, post, put};
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod export;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    let member_routes = Router::new()
        .route("/current", get(handler::current_settings))
        .route("/brenda-version", get(handler::brenda_version))
        .route("/{id}", get(handler::get_settings));

    let admin_routes = Router::new()
        .route("/aws-credentials", get(handler::aws_credentials))
        .route("/{id}", put(handler::update_settings))
        .route(
            "/{id}/buckets",
            post(handler::create_bucket).delete(handler::remove_bucket),
        )
        .route("/{id}/export", post(handler::export_settings))
        .route_layer(middleware::from_fn(crate::middleware::role::admin_guard));

    member_routes
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
