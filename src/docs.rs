use utoipa::OpenApi;
use crate::modules::auth::dto::*;
use crate::modules::jobs::dto::{CreateJobRequest, CreateQueueRequest};
use crate::modules::jobs::model::{Job, Queue};
use crate::modules::settings::dto::*;
use crate::modules::settings::model::{BucketAttribute, Settings};
use crate::modules::uploads::dto::{DiskFile, DiskUploadResponse};
use crate::modules::uploads::model::FileRecord;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::handler::register,
        crate::modules::auth::handler::login,
        crate::modules::auth::handler::get_me,
        crate::modules::settings::handler::get_settings,
        crate::modules::settings::handler::current_settings,
        crate::modules::settings::handler::update_settings,
        crate::modules::settings::handler::create_bucket,
        crate::modules::settings::handler::remove_bucket,
        crate::modules::settings::handler::aws_credentials,
        crate::modules::settings::handler::brenda_version,
        crate::modules::settings::handler::export_settings,
        crate::modules::uploads::handler::upload_to_disk,
        crate::modules::uploads::handler::upload_to_s3,
        crate::modules::uploads::handler::download,
        crate::modules::jobs::handler::create_job,
        crate::modules::jobs::handler::list_jobs,
        crate::modules::jobs::handler::get_job,
        crate::modules::jobs::handler::delete_job,
        crate::modules::jobs::handler::list_job_files,
        crate::modules::jobs::handler::create_queue,
        crate::modules::jobs::handler::list_queues,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, AuthResponse, UserResponse,
            Settings, BucketAttribute, UpdateSettingsRequest, BucketRequest, BucketResponse,
            RemovedBucketResponse, VersionResponse, ExportResponse,
            crate::config::credentials::AwsKeyPair,
            FileRecord, DiskFile, DiskUploadResponse,
            crate::common::upload::UploadedObject,
            crate::common::validation::ValidationIssue,
            Job, Queue, CreateJobRequest, CreateQueueRequest,
        )
    ),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Settings", description = "AWS settings and bucket management"),
        (name = "Uploads", description = "Render project uploads"),
        (name = "Jobs", description = "Render jobs and queues")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::Modify;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
