use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::model::BucketAttribute;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingsRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub ami_id: Option<String>,
    pub instance_type: Option<String>,
    pub aws_ec2_region: Option<String>,
    pub aws_sqs_region: Option<String>,
    pub aws_s3_region: Option<String>,
    #[validate(range(min = 1, message = "At least one instance is required"))]
    pub ec2_instance_count: Option<i32>,
    pub aws_s3_project_bucket: Option<String>,
    pub aws_s3_render_bucket: Option<String>,
}

/// Body of the bucket create and remove endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BucketRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub attribute: BucketAttribute,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct BucketResponse {
    pub bucket_name: String,
    /// `None` when an existing bucket was associated instead of created.
    pub location: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemovedBucketResponse {
    pub bucket_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportResponse {
    pub path: String,
}
