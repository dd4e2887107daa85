use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use crate::state::AppState;
use axum::middleware;
use tower_http::limit::RequestBodyLimitLayer;

pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    let upload = &state.config.upload;
    let with_framing = |max: u64| {
        usize::try_from(max.saturating_add(service::MULTIPART_FRAMING_ALLOWANCE)).unwrap_or(usize::MAX)
    };

    let disk_routes = Router::new()
        .route("/disk", post(handler::upload_to_disk))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(with_framing(upload.disk_max_bytes)));

    let s3_routes = Router::new()
        .route("/s3", post(handler::upload_to_s3))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(with_framing(upload.max_bytes)));

    Router::new()
        .route("/download/{*path}", get(handler::download))
        .merge(disk_routes)
        .merge(s3_routes)
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
