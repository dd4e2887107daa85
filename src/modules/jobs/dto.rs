use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn default_jump() -> i32 {
    1
}

fn default_instance_count() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_frame_range"))]
pub struct CreateJobRequest {
    #[validate(length(min = 1, message = "Job name is required"))]
    pub name: String,
    #[validate(range(min = 0, message = "Start frame cannot be negative"))]
    pub animation_start_frame: i32,
    pub animation_end_frame: i32,
    /// Defaults to every frame between start and end, inclusive.
    #[validate(range(min = 1, message = "A job must render at least one frame"))]
    pub animation_total_frames: Option<i32>,
    #[serde(default = "default_jump")]
    #[validate(range(min = 1, message = "Frame jump must be at least 1"))]
    pub animation_jump_frames: i32,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub ami_id: String,
    #[serde(default)]
    pub aws_ec2_region: String,
    #[serde(default)]
    pub aws_sqs_region: String,
    #[serde(default = "default_instance_count")]
    #[validate(range(min = 1, message = "At least one instance is required"))]
    pub aws_ec2_instance_count: i32,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Spend limit cannot be negative"))]
    pub max_spend_amount: f64,
    pub queue_id: Option<Uuid>,
}

impl CreateJobRequest {
    /// Frames from start to end inclusive, computed wide so extreme bounds cannot overflow.
    fn frame_span(&self) -> i64 {
        i64::from(self.animation_end_frame) - i64::from(self.animation_start_frame) + 1
    }

    /// Saturates at `i32::MAX`; validation rejects spans that large.
    pub fn total_frames(&self) -> i32 {
        self.animation_total_frames
            .unwrap_or_else(|| i32::try_from(self.frame_span()).unwrap_or(i32::MAX))
    }
}

fn frame_range_error(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("frame_range");
    err.message = Some(message.into());
    err
}

fn validate_frame_range(req: &CreateJobRequest) -> Result<(), ValidationError> {
    if req.animation_end_frame < req.animation_start_frame {
        return Err(frame_range_error("End frame cannot come before the start frame"));
    }
    if req.animation_total_frames.is_none() && i32::try_from(req.frame_span()).is_err() {
        return Err(frame_range_error("Frame range is too large"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateQueueRequest {
    #[validate(length(min = 1, message = "Queue name is required"))]
    pub name: String,
    #[serde(default)]
    pub aws_sqs_region: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::AppError;

    fn job(body: serde_json::Value) -> CreateJobRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let req = job(serde_json::json!({
            "name": "shot-010",
            "animation_start_frame": 1,
            "animation_end_frame": 240
        }));

        assert!(req.validate().is_ok());
        assert_eq!(req.total_frames(), 240);
        assert_eq!(req.animation_jump_frames, 1);
        assert_eq!(req.aws_ec2_instance_count, 1);
    }

    #[test]
    fn explicit_total_is_kept() {
        let req = job(serde_json::json!({
            "name": "shot-010",
            "animation_start_frame": 1,
            "animation_end_frame": 240,
            "animation_total_frames": 120,
            "animation_jump_frames": 2
        }));

        assert_eq!(req.total_frames(), 120);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let req = job(serde_json::json!({
            "name": "backwards",
            "animation_start_frame": 100,
            "animation_end_frame": 10
        }));

        let err = AppError::from(req.validate().unwrap_err());
        assert_eq!(err.to_string(), "End frame cannot come before the start frame");
    }

    #[test]
    fn zero_jump_is_rejected() {
        let req = job(serde_json::json!({
            "name": "stuck",
            "animation_start_frame": 1,
            "animation_end_frame": 10,
            "animation_jump_frames": 0
        }));

        let err = AppError::from(req.validate().unwrap_err());
        assert_eq!(err.to_string(), "Frame jump must be at least 1");
    }

    #[test]
    fn single_frame_job_is_valid() {
        let req = job(serde_json::json!({
            "name": "still",
            "animation_start_frame": 42,
            "animation_end_frame": 42
        }));

        assert!(req.validate().is_ok());
        assert_eq!(req.total_frames(), 1);
    }

    #[test]
    fn widest_frame_range_is_rejected_instead_of_overflowing() {
        let req = job(serde_json::json!({
            "name": "forever",
            "animation_start_frame": 0,
            "animation_end_frame": i32::MAX
        }));

        let err = AppError::from(req.validate().unwrap_err());
        assert_eq!(err.to_string(), "Frame range is too large");
        assert_eq!(req.total_frames(), i32::MAX);
    }

    #[test]
    fn largest_representable_range_is_accepted() {
        let req = job(serde_json::json!({
            "name": "long",
            "animation_start_frame": 1,
            "animation_end_frame": i32::MAX
        }));

        assert!(req.validate().is_ok());
        assert_eq!(req.total_frames(), i32::MAX);
    }
}
