use axum::http::StatusCode;
use thiserror::Error;

use super::response::ApiError;
use super::upload::UploadError;
use crate::config::ConfigError;
use crate::infrastructure::storage::StorageError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}", .0.join(" "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Provider(#[from] StorageError),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Upload failed: {0}")]
    Upload(UploadError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::Upload(UploadError::TimedOut(_)) => StatusCode::REQUEST_TIMEOUT,
            AppError::Upload(UploadError::Source(_)) => StatusCode::BAD_REQUEST,
            AppError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) | AppError::Persistence(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Storage(e) => AppError::Provider(e),
            UploadError::TooLarge { .. } => AppError::Validation(vec![err.to_string()]),
            other => AppError::Upload(other),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for {field}."),
                })
            })
            .collect::<Vec<_>>();

        messages.sort();
        if messages.is_empty() {
            messages.push(errors.to_string());
        }
        AppError::Validation(messages)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!("{}", err);
        }
        ApiError(err.to_string(), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = AppError::Validation(vec![
            "Wrong filetype (text/plain).".into(),
            "Filesize exceeded: 20/10.".into(),
        ]);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Wrong filetype (text/plain). Filesize exceeded: 20/10.");
    }

    #[test]
    fn storage_failures_inside_uploads_are_provider_errors() {
        let err: AppError = UploadError::Storage(StorageError::from_raw("UploadPart", "boom")).into();
        assert!(matches!(err, AppError::Provider(_)));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn oversized_uploads_are_validation_errors() {
        let err: AppError = UploadError::TooLarge { received: 11, max: 10 }.into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
