use super::dto::{CreateJobRequest, CreateQueueRequest};
use super::model::{Job, Queue};
use super::service::{JobService, QueueService};
use crate::common::error::AppError;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::auth::dto::TokenClaims;
use crate::modules::uploads::model::FileRecord;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

/// Create a render job
#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job created", body = ApiResponse<Job>),
        (status = 400, description = "Bad Request"),
        (status = 404, description = "Queue not found")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Json(payload): Json<CreateJobRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return ApiError::from(AppError::from(e)).into_response();
    }

    match JobService::create(state, &claims, payload).await {
        Ok(job) => ApiSuccess(ApiResponse::success(job, "Job created successfully"), StatusCode::CREATED).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// List render jobs
#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    responses(
        (status = 200, description = "List of jobs", body = ApiResponse<Vec<Job>>)
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> impl IntoResponse {
    match JobService::list(state, &claims).await {
        Ok(jobs) => ApiSuccess(ApiResponse::success(jobs, "Jobs retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Get job by ID
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job details", body = ApiResponse<Job>),
        (status = 404, description = "Job not found")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match JobService::find_by_id(state, &claims, id).await {
        Ok(job) => ApiSuccess(ApiResponse::success(job, "Job retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Delete a job and its file records
#[utoipa::path(
    delete,
    path = "/api/v1/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job deleted", body = ApiResponse<String>),
        (status = 404, description = "Job not found")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match JobService::delete(state, &claims, id).await {
        Ok(_) => ApiSuccess(ApiResponse::success((), "Job deleted successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Files uploaded for a job
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}/files",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Files of the job", body = ApiResponse<Vec<FileRecord>>),
        (status = 404, description = "Job not found")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn list_job_files(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match JobService::files(state, &claims, id).await {
        Ok(files) => ApiSuccess(ApiResponse::success(files, "Files retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Create a queue
#[utoipa::path(
    post,
    path = "/api/v1/queues",
    request_body = CreateQueueRequest,
    responses(
        (status = 201, description = "Queue created", body = ApiResponse<Queue>),
        (status = 400, description = "Bad Request"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn create_queue(
    State(state): State<AppState>,
    Json(payload): Json<CreateQueueRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return ApiError::from(AppError::from(e)).into_response();
    }

    match QueueService::create(state, payload).await {
        Ok(queue) => ApiSuccess(ApiResponse::success(queue, "Queue created successfully"), StatusCode::CREATED).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// List queues
#[utoipa::path(
    get,
    path = "/api/v1/queues",
    responses(
        (status = 200, description = "List of queues", body = ApiResponse<Vec<Queue>>)
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn list_queues(State(state): State<AppState>) -> impl IntoResponse {
    match QueueService::list(state).await {
        Ok(queues) => ApiSuccess(ApiResponse::success(queues, "Queues retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
