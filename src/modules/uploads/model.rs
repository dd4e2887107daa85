use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Metadata of one compressed upload stored in S3. Written once, never updated.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema, Clone, PartialEq)]
pub struct FileRecord {
    pub id: Uuid,
    pub job_id: Option<Uuid>,
    pub upload_name: String,
    pub extension: String,
    pub original_name: String,
    pub content_type: String,
    pub upload_size: i64,
    pub aws_s3_location: String,
    pub aws_s3_bucket: String,
    pub aws_s3_etag: String,
    pub uploaded_by: Uuid,
    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFileRecord {
    pub job_id: Option<Uuid>,
    pub upload_name: String,
    pub extension: String,
    pub original_name: String,
    pub content_type: String,
    pub upload_size: i64,
    pub aws_s3_location: String,
    pub aws_s3_bucket: String,
    pub aws_s3_etag: String,
    pub uploaded_by: Uuid,
}

/// Where the uploaded bytes came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDescriptor {
    /// A file already written to local disk.
    Disk {
        upload_name: String,
        content_type: String,
        size: u64,
    },
    /// A request body streamed straight to storage.
    Stream {
        upload_name: String,
        content_type: String,
        byte_count: u64,
    },
}

impl UploadDescriptor {
    pub fn original_name(&self) -> &str {
        match self {
            UploadDescriptor::Disk { upload_name, .. } | UploadDescriptor::Stream { upload_name, .. } => {
                upload_name
            }
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            UploadDescriptor::Disk { content_type, .. } | UploadDescriptor::Stream { content_type, .. } => {
                content_type
            }
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            UploadDescriptor::Disk { size, .. } => *size,
            UploadDescriptor::Stream { byte_count, .. } => *byte_count,
        }
    }
}
