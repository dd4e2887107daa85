use super::dto::{
    BucketRequest, BucketResponse, ExportResponse, RemovedBucketResponse, UpdateSettingsRequest,
    VersionResponse,
};
use super::model::Settings;
use super::service::SettingsService;
use crate::common::error::AppError;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::config::credentials::AwsKeyPair;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

/// Get settings by ID
#[utoipa::path(
    get,
    path = "/api/v1/settings/{id}",
    params(
        ("id" = i32, Path, description = "Settings ID")
    ),
    responses(
        (status = 200, description = "Settings", body = ApiResponse<Settings>),
        (status = 404, description = "Settings not found")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn get_settings(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match SettingsService::find_by_id(state, id).await {
        Ok(settings) => ApiSuccess(
            ApiResponse::success(settings, "Settings retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Get the active settings record
#[utoipa::path(
    get,
    path = "/api/v1/settings/current",
    responses(
        (status = 200, description = "Settings", body = ApiResponse<Settings>),
        (status = 404, description = "No settings saved yet")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn current_settings(State(state): State<AppState>) -> impl IntoResponse {
    match SettingsService::current(state).await {
        Ok(settings) => ApiSuccess(
            ApiResponse::success(settings, "Settings retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Update settings
#[utoipa::path(
    put,
    path = "/api/v1/settings/{id}",
    params(
        ("id" = i32, Path, description = "Settings ID")
    ),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<Settings>),
        (status = 400, description = "Bad Request"),
        (status = 404, description = "Settings not found"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return ApiError::from(AppError::from(e)).into_response();
    }

    match SettingsService::update(state, id, payload).await {
        Ok(settings) => ApiSuccess(
            ApiResponse::success(settings, "Settings updated successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Create an S3 bucket, or associate one you already own
#[utoipa::path(
    post,
    path = "/api/v1/settings/{id}/buckets",
    params(
        ("id" = i32, Path, description = "Settings ID")
    ),
    request_body = BucketRequest,
    responses(
        (status = 201, description = "Bucket created or associated", body = ApiResponse<BucketResponse>),
        (status = 400, description = "Missing name or region"),
        (status = 502, description = "Provider error")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn create_bucket(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<BucketRequest>,
) -> impl IntoResponse {
    match SettingsService::create_bucket(state, id, &payload.name, &payload.region, payload.attribute).await {
        Ok(bucket) => ApiSuccess(
            ApiResponse::success(bucket, "Bucket created successfully"),
            StatusCode::CREATED,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Delete an S3 bucket and clear it from settings
#[utoipa::path(
    delete,
    path = "/api/v1/settings/{id}/buckets",
    params(
        ("id" = i32, Path, description = "Settings ID")
    ),
    request_body = BucketRequest,
    responses(
        (status = 200, description = "Bucket removed", body = ApiResponse<RemovedBucketResponse>),
        (status = 400, description = "Missing name or region"),
        (status = 502, description = "Provider error")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn remove_bucket(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<BucketRequest>,
) -> impl IntoResponse {
    match SettingsService::remove_bucket(state, id, &payload.name, &payload.region, payload.attribute).await {
        Ok(bucket_name) => ApiSuccess(
            ApiResponse::success(RemovedBucketResponse { bucket_name }, "Bucket removed successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Read the access keys from the shared AWS credentials file
#[utoipa::path(
    get,
    path = "/api/v1/settings/aws-credentials",
    responses(
        (status = 200, description = "Credentials found", body = ApiResponse<AwsKeyPair>),
        (status = 500, description = "Credentials file missing or incomplete")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn aws_credentials() -> impl IntoResponse {
    match SettingsService::aws_credentials().await {
        Ok(keys) => ApiSuccess(ApiResponse::success(keys, "Credentials loaded"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Installed Brenda version
#[utoipa::path(
    get,
    path = "/api/v1/settings/brenda-version",
    responses(
        (status = 200, description = "Version", body = ApiResponse<VersionResponse>),
        (status = 500, description = "Setup file missing or unversioned")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn brenda_version(State(state): State<AppState>) -> impl IntoResponse {
    match SettingsService::brenda_version(state).await {
        Ok(version) => ApiSuccess(ApiResponse::success(version, "Version found"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Write settings to the JS config file (deprecated)
#[utoipa::path(
    post,
    path = "/api/v1/settings/{id}/export",
    params(
        ("id" = i32, Path, description = "Settings ID")
    ),
    responses(
        (status = 200, description = "Config file written", body = ApiResponse<ExportResponse>),
        (status = 404, description = "Settings not found")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn export_settings(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match SettingsService::export(state, id).await {
        Ok(export) => ApiSuccess(
            ApiResponse::success(export, "Amazon config file saved successfully!"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
