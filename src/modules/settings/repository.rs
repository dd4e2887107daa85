use async_trait::async_trait;
use sqlx::PgPool;

use super::dto::UpdateSettingsRequest;
use super::model::{BucketAttribute, Settings};

const SETTINGS_COLUMNS: &str = "id, email, ami_id, instance_type, aws_ec2_region, aws_sqs_region, \
     aws_s3_region, ec2_instance_count, aws_s3_project_bucket, aws_s3_render_bucket, \
     created_at, updated_at";

/// Settings access used by the bucket manager and the S3 upload flow.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The record with the lowest id, if any has been saved.
    async fn current_settings(&self) -> Result<Option<Settings>, sqlx::Error>;

    /// Returns `None` when no row has the given id.
    async fn set_bucket_attribute(
        &self,
        id: i32,
        attribute: BucketAttribute,
        value: &str,
    ) -> Result<Option<Settings>, sqlx::Error>;
}

pub struct SettingsRepository;

impl SettingsRepository {
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Settings>, sqlx::Error> {
        sqlx::query_as::<_, Settings>(&format!("SELECT {SETTINGS_COLUMNS} FROM settings WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_current(pool: &PgPool) -> Result<Option<Settings>, sqlx::Error> {
        sqlx::query_as::<_, Settings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings ORDER BY id ASC LIMIT 1"
        ))
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        req: &UpdateSettingsRequest,
    ) -> Result<Option<Settings>, sqlx::Error> {
        sqlx::query_as::<_, Settings>(&format!(
            r#"
            UPDATE settings
            SET
                email = COALESCE($1, email),
                ami_id = COALESCE($2, ami_id),
                instance_type = COALESCE($3, instance_type),
                aws_ec2_region = COALESCE($4, aws_ec2_region),
                aws_sqs_region = COALESCE($5, aws_sqs_region),
                aws_s3_region = COALESCE($6, aws_s3_region),
                ec2_instance_count = COALESCE($7, ec2_instance_count),
                aws_s3_project_bucket = COALESCE($8, aws_s3_project_bucket),
                aws_s3_render_bucket = COALESCE($9, aws_s3_render_bucket),
                updated_at = NOW()
            WHERE id = $10
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(&req.email)
        .bind(&req.ami_id)
        .bind(&req.instance_type)
        .bind(&req.aws_ec2_region)
        .bind(&req.aws_sqs_region)
        .bind(&req.aws_s3_region)
        .bind(req.ec2_instance_count)
        .bind(&req.aws_s3_project_bucket)
        .bind(&req.aws_s3_render_bucket)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_bucket_attribute(
        pool: &PgPool,
        id: i32,
        attribute: BucketAttribute,
        value: &str,
    ) -> Result<Option<Settings>, sqlx::Error> {
        // Column names cannot be bound, so each attribute gets its own statement.
        let column = attribute.as_str();
        sqlx::query_as::<_, Settings>(&format!(
            "UPDATE settings SET {column} = $1, updated_at = NOW() WHERE id = $2 RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(value)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[async_trait]
impl SettingsStore for PgPool {
    async fn current_settings(&self) -> Result<Option<Settings>, sqlx::Error> {
        SettingsRepository::find_current(self).await
    }

    async fn set_bucket_attribute(
        &self,
        id: i32,
        attribute: BucketAttribute,
        value: &str,
    ) -> Result<Option<Settings>, sqlx::Error> {
        SettingsRepository::set_bucket_attribute(self, id, attribute, value).await
    }
}
