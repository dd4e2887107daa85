use super::dto::{CreateJobRequest, CreateQueueRequest};
use super::model::{Job, Queue};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, name, animation_start_frame, animation_end_frame, animation_total_frames, \
     animation_jump_frames, instance_type, ami_id, aws_ec2_region, aws_sqs_region, \
     aws_ec2_instance_count, max_spend_amount, queue_id, owner_id, created_at, updated_at";

const QUEUE_COLUMNS: &str = "id, name, aws_sqs_region, created_at, updated_at";

/// Job lookups needed outside the jobs module.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, sqlx::Error>;
}

pub struct JobRepository;

impl JobRepository {
    pub async fn create(pool: &PgPool, owner_id: Uuid, req: &CreateJobRequest) -> Result<Job, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (
                name, animation_start_frame, animation_end_frame, animation_total_frames,
                animation_jump_frames, instance_type, ami_id, aws_ec2_region, aws_sqs_region,
                aws_ec2_instance_count, max_spend_amount, queue_id, owner_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&req.name)
        .bind(req.animation_start_frame)
        .bind(req.animation_end_frame)
        .bind(req.total_frames())
        .bind(req.animation_jump_frames)
        .bind(&req.instance_type)
        .bind(&req.ami_id)
        .bind(&req.aws_ec2_region)
        .bind(&req.aws_sqs_region)
        .bind(req.aws_ec2_instance_count)
        .bind(req.max_spend_amount)
        .bind(req.queue_id)
        .bind(owner_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC"))
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Files belonging to the job are removed by the foreign key cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct QueueRepository;

impl QueueRepository {
    pub async fn create(pool: &PgPool, req: &CreateQueueRequest) -> Result<Queue, sqlx::Error> {
        sqlx::query_as::<_, Queue>(&format!(
            "INSERT INTO queues (name, aws_sqs_region) VALUES ($1, $2) RETURNING {QUEUE_COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.aws_sqs_region)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Queue>, sqlx::Error> {
        sqlx::query_as::<_, Queue>(&format!("SELECT {QUEUE_COLUMNS} FROM queues ORDER BY name ASC"))
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Queue>, sqlx::Error> {
        sqlx::query_as::<_, Queue>(&format!("SELECT {QUEUE_COLUMNS} FROM queues WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

#[async_trait]
impl JobStore for PgPool {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        JobRepository::find_by_id(self, id).await
    }
}
