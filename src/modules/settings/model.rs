use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema, Clone, PartialEq)]
pub struct Settings {
    pub id: i32,
    pub email: String,
    pub ami_id: String,
    pub instance_type: String,
    pub aws_ec2_region: String,
    pub aws_sqs_region: String,
    pub aws_s3_region: String,
    pub ec2_instance_count: i32,
    pub aws_s3_project_bucket: String,
    pub aws_s3_render_bucket: String,
    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601")]
    pub updated_at: OffsetDateTime,
}

impl Settings {
    /// Every attribute with its value, in declaration order.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("email", self.email.clone()),
            ("ami_id", self.ami_id.clone()),
            ("instance_type", self.instance_type.clone()),
            ("aws_ec2_region", self.aws_ec2_region.clone()),
            ("aws_sqs_region", self.aws_sqs_region.clone()),
            ("aws_s3_region", self.aws_s3_region.clone()),
            ("ec2_instance_count", self.ec2_instance_count.to_string()),
            ("aws_s3_project_bucket", self.aws_s3_project_bucket.clone()),
            ("aws_s3_render_bucket", self.aws_s3_render_bucket.clone()),
            ("created_at", self.created_at.to_string()),
            ("updated_at", self.updated_at.to_string()),
        ]
    }

    pub fn set_bucket(&mut self, attribute: BucketAttribute, name: &str) {
        let slot = match attribute {
            BucketAttribute::AwsS3ProjectBucket => &mut self.aws_s3_project_bucket,
            BucketAttribute::AwsS3RenderBucket => &mut self.aws_s3_render_bucket,
        };
        *slot = name.to_string();
    }
}

/// Settings column that stores a bucket name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BucketAttribute {
    AwsS3ProjectBucket,
    AwsS3RenderBucket,
}

impl BucketAttribute {
    pub fn as_str(self) -> &'static str {
        match self {
            BucketAttribute::AwsS3ProjectBucket => "aws_s3_project_bucket",
            BucketAttribute::AwsS3RenderBucket => "aws_s3_render_bucket",
        }
    }
}

impl std::fmt::Display for BucketAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
