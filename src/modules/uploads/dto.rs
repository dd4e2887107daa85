use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct S3UploadQuery {
    /// Job the uploaded file belongs to.
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct DiskFile {
    pub name: String,
    pub size: u64,
    pub url: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiskUploadResponse {
    pub files: Vec<DiskFile>,
}
