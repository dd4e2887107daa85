use super::dto::{DiskUploadResponse, S3UploadQuery};
use super::model::FileRecord;
use super::service::{self, UploadService};
use crate::common::error::AppError;
use crate::common::validation::IncomingFile;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::auth::dto::TokenClaims;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Extension, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use tokio_util::io::ReaderStream;

const S3_FIELD: &str = "filedata";
const DISK_FIELDS: &[&str] = &["files[]", "files"];

/// File size implied by `Content-Length`, less the multipart framing around it.
/// The exact limit is enforced on the bytes actually received.
fn declared_file_size(headers: &HeaderMap) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .map_or(0, |len| len.saturating_sub(service::MULTIPART_FRAMING_ALLOWANCE))
}

/// Upload files to the local upload directory
#[utoipa::path(
    post,
    path = "/api/v1/uploads/disk",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Files saved", body = ApiResponse<DiskUploadResponse>),
        (status = 400, description = "Bad Request"),
        (status = 413, description = "Request too large")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
pub async fn upload_to_disk(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let max = state.config.upload.disk_max_bytes;
    let mut files = Vec::new();
    let mut used = 0u64;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return ApiError(e.body_text(), e.status()).into_response(),
        };

        if !field.name().is_some_and(|name| DISK_FIELDS.contains(&name)) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        match service::save_to_disk(&state.config.upload_dir, &file_name, field, used, max).await {
            Ok(saved) => {
                used += saved.size;
                files.push(saved);
            }
            Err(e) => return ApiError::from(e).into_response(),
        }
    }

    if files.is_empty() {
        return ApiError::from(AppError::validation("No file provided")).into_response();
    }

    ApiSuccess(
        ApiResponse::success(DiskUploadResponse { files }, "Files uploaded successfully"),
        StatusCode::OK,
    )
    .into_response()
}

/// Compress a render project and stream it to the project bucket
#[utoipa::path(
    post,
    path = "/api/v1/uploads/s3",
    params(S3UploadQuery),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Upload stored and recorded", body = ApiResponse<FileRecord>),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Job not found"),
        (status = 408, description = "Upload took too long"),
        (status = 502, description = "Provider error")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
pub async fn upload_to_s3(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Query(query): Query<S3UploadQuery>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let declared = declared_file_size(&headers);

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return ApiError(e.body_text(), e.status()).into_response(),
        };

        if field.name() != Some(S3_FIELD) {
            continue;
        }

        let incoming = IncomingFile {
            file_name: field.file_name().unwrap_or_default().to_string(),
            content_type: field.content_type().map(str::to_string),
            byte_count: declared,
        };

        return match UploadService::upload_to_s3(state, &claims, query.job_id, incoming, field).await
        {
            Ok(record) => ApiSuccess(
                ApiResponse::success(record, "File uploaded successfully"),
                StatusCode::CREATED,
            )
            .into_response(),
            Err(e) => ApiError::from(e).into_response(),
        };
    }

    ApiError::from(AppError::validation("No file provided")).into_response()
}

/// Download a file from the local upload directory
#[utoipa::path(
    get,
    path = "/api/v1/uploads/download/{path}",
    params(
        ("path" = String, Path, description = "File path relative to the upload directory")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "File not found")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
pub async fn download(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    let (file, full_path, len) = match UploadService::open_download(&state, &path).await {
        Ok(found) => found,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let mime = mime_guess::from_path(&full_path).first_or_octet_stream();
    let name = full_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download")
        .replace('"', "");

    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_length(len: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_str(len).unwrap());
        headers
    }

    #[test]
    fn framing_is_not_counted_against_the_file() {
        let max = 100 * 1024 * 1024;
        let request = max + service::MULTIPART_FRAMING_ALLOWANCE;

        assert_eq!(declared_file_size(&with_length(&request.to_string())), max);
    }

    #[test]
    fn tiny_or_missing_lengths_declare_nothing() {
        assert_eq!(declared_file_size(&with_length("512")), 0);
        assert_eq!(declared_file_size(&with_length("not-a-number")), 0);
        assert_eq!(declared_file_size(&HeaderMap::new()), 0);
    }
}
