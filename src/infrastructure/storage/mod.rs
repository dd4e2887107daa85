pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

/// Failures reported by the object storage provider.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The bucket exists and already belongs to the calling account.
    #[error("Bucket {bucket} already exists and is owned by you")]
    BucketAlreadyOwned { bucket: String },

    #[error("{operation} failed{}: {message}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Provider {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },
}

impl StorageError {
    /// Builds a provider error from a raw message, extracting `code` and
    /// `message` when the text carries a JSON payload after a prefix such as
    /// `Failed to create a multipart upload on S3 {"message":...}`.
    pub fn from_raw(operation: &'static str, raw: &str) -> Self {
        #[derive(Deserialize)]
        struct Payload {
            message: Option<String>,
            code: Option<String>,
        }

        let parsed = raw
            .find('{')
            .and_then(|start| serde_json::from_str::<Payload>(&raw[start..]).ok());

        match parsed {
            Some(Payload {
                message: Some(message),
                code,
            }) => StorageError::Provider {
                operation,
                code,
                message,
            },
            _ => StorageError::Provider {
                operation,
                code: None,
                message: raw.trim().to_string(),
            },
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            StorageError::BucketAlreadyOwned { .. } => Some("BucketAlreadyOwnedByYou"),
            StorageError::Provider { code, .. } => code.as_deref(),
        }
    }
}

/// Bucket and key of an object being written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTarget {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    pub part_number: i32,
    pub e_tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedUpload {
    pub location: Option<String>,
    pub e_tag: Option<String>,
}

/// Object storage operations used by the bucket manager and the uploader.
///
/// Multipart uploads are created with the `authenticated-read` ACL and the
/// reduced-redundancy storage class.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the bucket location reported by the provider, if any.
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<Option<String>, StorageError>;

    async fn delete_bucket(&self, bucket: &str, region: &str) -> Result<(), StorageError>;

    /// Returns the upload id.
    async fn create_multipart_upload(&self, target: &ObjectTarget) -> Result<String, StorageError>;

    async fn upload_part(
        &self,
        target: &ObjectTarget,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<UploadedPart, StorageError>;

    async fn complete_multipart_upload(
        &self,
        target: &ObjectTarget,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> Result<CompletedUpload, StorageError>;

    async fn abort_multipart_upload(&self, target: &ObjectTarget, upload_id: &str) -> Result<(), StorageError>;

    /// Public URL of an object, used when the provider does not report one.
    fn object_url(&self, target: &ObjectTarget) -> String {
        format!("https://{}.s3.amazonaws.com/{}", target.bucket, target.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_error_with_json_payload_is_parsed() {
        let raw = r#"Failed to create a multipart upload on S3: {"message":"Inaccessible host: `s3-us-west-2.amazonaws.com'.","code":"UnknownEndpoint","region":"us-west-2","retryable":true}"#;

        match StorageError::from_raw("CreateMultipartUpload", raw) {
            StorageError::Provider { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("UnknownEndpoint"));
                assert_eq!(message, "Inaccessible host: `s3-us-west-2.amazonaws.com'.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn raw_error_without_payload_is_kept_verbatim() {
        let raw = "Failed to create a multipart upload on S3 {not json";

        match StorageError::from_raw("CreateMultipartUpload", raw) {
            StorageError::Provider { code, message, .. } => {
                assert!(code.is_none());
                assert_eq!(message, raw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn provider_error_display_includes_code() {
        let err = StorageError::Provider {
            operation: "DeleteBucket",
            code: Some("BucketNotEmpty".into()),
            message: "The bucket you tried to delete is not empty".into(),
        };
        assert_eq!(
            err.to_string(),
            "DeleteBucket failed (BucketNotEmpty): The bucket you tried to delete is not empty"
        );
    }
}
