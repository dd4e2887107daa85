use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema, Clone, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub animation_start_frame: i32,
    pub animation_end_frame: i32,
    pub animation_total_frames: i32,
    pub animation_jump_frames: i32,
    pub instance_type: String,
    pub ami_id: String,
    pub aws_ec2_region: String,
    pub aws_sqs_region: String,
    pub aws_ec2_instance_count: i32,
    pub max_spend_amount: f64,
    pub queue_id: Option<Uuid>,
    pub owner_id: Uuid,
    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601")]
    pub updated_at: OffsetDateTime,
}

/// An SQS work queue that render jobs are dispatched through.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema, Clone, PartialEq)]
pub struct Queue {
    pub id: Uuid,
    pub name: String,
    pub aws_sqs_region: String,
    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601")]
    pub updated_at: OffsetDateTime,
}
