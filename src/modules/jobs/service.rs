use super::dto::{CreateJobRequest, CreateQueueRequest};
use super::model::{Job, Queue};
use super::repository::{JobRepository, QueueRepository};
use crate::common::error::{AppError, AppResult};
use crate::modules::auth::dto::TokenClaims;
use crate::modules::auth::model::UserRole;
use crate::modules::uploads::model::FileRecord;
use crate::modules::uploads::service::UploadService;
use crate::state::AppState;
use tracing::info;
use uuid::Uuid;

fn is_admin(claims: &TokenClaims) -> bool {
    claims.role == UserRole::Admin.as_str()
}

/// Whether `claims` may see or change `job`.
pub fn can_access(job: &Job, claims: &TokenClaims) -> bool {
    job.owner_id == claims.sub || is_admin(claims)
}

pub struct JobService;

impl JobService {
    pub async fn create(state: AppState, owner: &TokenClaims, req: CreateJobRequest) -> AppResult<Job> {
        if let Some(queue_id) = req.queue_id {
            QueueRepository::find_by_id(&state.db, queue_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Queue {queue_id} not found")))?;
        }

        let job = JobRepository::create(&state.db, owner.sub, &req).await?;
        info!(
            "Created job {} ({} frames from {} to {})",
            job.id, job.animation_total_frames, job.animation_start_frame, job.animation_end_frame
        );
        Ok(job)
    }

    /// Admins see every job, everyone else only their own.
    pub async fn list(state: AppState, claims: &TokenClaims) -> AppResult<Vec<Job>> {
        let jobs = if is_admin(claims) {
            JobRepository::find_all(&state.db).await?
        } else {
            JobRepository::find_by_owner(&state.db, claims.sub).await?
        };
        Ok(jobs)
    }

    pub async fn find_by_id(state: AppState, claims: &TokenClaims, id: Uuid) -> AppResult<Job> {
        JobRepository::find_by_id(&state.db, id)
            .await?
            .filter(|job| can_access(job, claims))
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
    }

    pub async fn delete(state: AppState, claims: &TokenClaims, id: Uuid) -> AppResult<()> {
        Self::find_by_id(state.clone(), claims, id).await?;

        if !JobRepository::delete(&state.db, id).await? {
            return Err(AppError::NotFound(format!("Job {id} not found")));
        }
        info!("Deleted job {}", id);
        Ok(())
    }

    pub async fn files(state: AppState, claims: &TokenClaims, id: Uuid) -> AppResult<Vec<FileRecord>> {
        Self::find_by_id(state.clone(), claims, id).await?;
        UploadService::files_for_job(state, id).await
    }
}

pub struct QueueService;

impl QueueService {
    pub async fn create(state: AppState, req: CreateQueueRequest) -> AppResult<Queue> {
        let queue = QueueRepository::create(&state.db, &req).await?;
        info!("Created queue {} in {}", queue.name, queue.aws_sqs_region);
        Ok(queue)
    }

    pub async fn list(state: AppState) -> AppResult<Vec<Queue>> {
        Ok(QueueRepository::find_all(&state.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn job_owned_by(owner_id: Uuid) -> Job {
        Job {
            id: Uuid::new_v4(),
            name: "shot-010".into(),
            animation_start_frame: 1,
            animation_end_frame: 10,
            animation_total_frames: 10,
            animation_jump_frames: 1,
            instance_type: "c4.large".into(),
            ami_id: "ami-0abc".into(),
            aws_ec2_region: "us-west-2".into(),
            aws_sqs_region: "us-west-2".into(),
            aws_ec2_instance_count: 1,
            max_spend_amount: 0.5,
            queue_id: None,
            owner_id,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn claims(sub: Uuid, role: UserRole) -> TokenClaims {
        TokenClaims {
            sub,
            role: role.to_string(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn owners_and_admins_can_access_a_job() {
        let owner = Uuid::new_v4();
        let job = job_owned_by(owner);

        assert!(can_access(&job, &claims(owner, UserRole::User)));
        assert!(can_access(&job, &claims(Uuid::new_v4(), UserRole::Admin)));
        assert!(!can_access(&job, &claims(Uuid::new_v4(), UserRole::User)));
    }
}
