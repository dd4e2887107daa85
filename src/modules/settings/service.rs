use tracing::{error, info, warn};

use super::dto::{BucketResponse, ExportResponse, UpdateSettingsRequest, VersionResponse};
use super::export;
use super::model::{BucketAttribute, Settings};
use super::repository::{SettingsRepository, SettingsStore};
use crate::common::error::{AppError, AppResult};
use crate::config::credentials::{self, AwsKeyPair};
use crate::config::version;
use crate::infrastructure::storage::{ObjectStore, StorageError};
use crate::state::AppState;

fn settings_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Settings {id} not found"))
}

/// Creates and removes buckets, keeping the settings record in step.
pub struct BucketManager<'a> {
    storage: &'a dyn ObjectStore,
    settings: &'a dyn SettingsStore,
}

impl<'a> BucketManager<'a> {
    pub fn new(storage: &'a dyn ObjectStore, settings: &'a dyn SettingsStore) -> Self {
        Self { storage, settings }
    }

    fn require(name: &str, region: &str, action: &str) -> AppResult<()> {
        if name.trim().is_empty() {
            return Err(AppError::validation(format!(
                "You must provide a name before you can {action} a bucket."
            )));
        }
        if region.trim().is_empty() {
            return Err(AppError::validation(format!(
                "You must provide a region before you can {action} a bucket."
            )));
        }
        Ok(())
    }

    /// Creates `name` in `region`. A bucket the caller already owns is
    /// associated with settings `id` under `attribute` instead.
    pub async fn create_bucket(
        &self,
        id: i32,
        name: &str,
        region: &str,
        attribute: BucketAttribute,
    ) -> AppResult<BucketResponse> {
        Self::require(name, region, "create")?;

        match self.storage.create_bucket(name, region).await {
            Ok(location) => {
                info!("Created bucket {} in {}", name, region);
                Ok(BucketResponse {
                    bucket_name: name.to_string(),
                    location,
                })
            }
            Err(StorageError::BucketAlreadyOwned { .. }) => {
                warn!("Bucket {} is already owned, associating it with settings {}", name, id);

                self.settings
                    .set_bucket_attribute(id, attribute, name)
                    .await?
                    .ok_or_else(|| settings_not_found(id))?;

                info!("Updated settings property {} with {}.", attribute, name);
                Ok(BucketResponse {
                    bucket_name: name.to_string(),
                    location: None,
                })
            }
            Err(e) => {
                error!("Failed to create bucket {}: {}", name, e);
                Err(e.into())
            }
        }
    }

    /// Deletes `name` and clears `attribute` on settings `id`.
    pub async fn remove_bucket(
        &self,
        id: i32,
        name: &str,
        region: &str,
        attribute: BucketAttribute,
    ) -> AppResult<String> {
        Self::require(name, region, "remove")?;

        self.storage.delete_bucket(name, region).await.map_err(|e| {
            error!("Failed to delete bucket {}: {}", name, e);
            AppError::from(e)
        })?;

        self.settings
            .set_bucket_attribute(id, attribute, "")
            .await?
            .ok_or_else(|| settings_not_found(id))?;

        info!("Removed bucket {} and cleared {}", name, attribute);
        Ok(name.to_string())
    }
}

pub struct SettingsService;

impl SettingsService {
    pub async fn find_by_id(state: AppState, id: i32) -> AppResult<Settings> {
        SettingsRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(|| settings_not_found(id))
    }

    pub async fn current(state: AppState) -> AppResult<Settings> {
        SettingsRepository::find_current(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("No settings have been saved yet".to_string()))
    }

    pub async fn update(state: AppState, id: i32, req: UpdateSettingsRequest) -> AppResult<Settings> {
        SettingsRepository::update(&state.db, id, &req)
            .await?
            .ok_or_else(|| settings_not_found(id))
    }

    pub async fn create_bucket(
        state: AppState,
        id: i32,
        name: &str,
        region: &str,
        attribute: BucketAttribute,
    ) -> AppResult<BucketResponse> {
        BucketManager::new(state.storage.as_ref(), &state.db)
            .create_bucket(id, name, region, attribute)
            .await
    }

    pub async fn remove_bucket(
        state: AppState,
        id: i32,
        name: &str,
        region: &str,
        attribute: BucketAttribute,
    ) -> AppResult<String> {
        BucketManager::new(state.storage.as_ref(), &state.db)
            .remove_bucket(id, name, region, attribute)
            .await
    }

    pub async fn aws_credentials() -> AppResult<AwsKeyPair> {
        Ok(credentials::load().await?)
    }

    pub async fn brenda_version(state: AppState) -> AppResult<VersionResponse> {
        let version = version::brenda_version(&state.config.brenda_setup_file).await?;
        Ok(VersionResponse { version })
    }

    pub async fn export(state: AppState, id: i32) -> AppResult<ExportResponse> {
        let settings = Self::find_by_id(state.clone(), id).await?;
        let path = &state.config.aws_config_output;

        export::export_config_file(&settings, path).await?;
        info!("Amazon config file saved to {}", path.display());

        Ok(ExportResponse {
            path: path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemorySettings, MemoryStore};

    #[tokio::test]
    async fn missing_name_fails_before_any_provider_call() {
        let store = MemoryStore::new();
        let settings = MemorySettings::with(vec![crate::testing::sample_settings(5)]);

        let err = BucketManager::new(&store, &settings)
            .create_bucket(5, "", "us-west-2", BucketAttribute::AwsS3ProjectBucket)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "You must provide a name before you can create a bucket.");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn name_is_checked_before_region() {
        let store = MemoryStore::new();
        let settings = MemorySettings::default();

        let err = BucketManager::new(&store, &settings)
            .remove_bucket(1, "", "", BucketAttribute::AwsS3RenderBucket)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You must provide a name before you can remove a bucket.");

        let err = BucketManager::new(&store, &settings)
            .create_bucket(1, "renders", "", BucketAttribute::AwsS3RenderBucket)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You must provide a region before you can create a bucket.");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn new_bucket_reports_location_and_leaves_settings_alone() {
        let store = MemoryStore::new();
        let settings = MemorySettings::with(vec![crate::testing::sample_settings(1)]);

        let created = BucketManager::new(&store, &settings)
            .create_bucket(1, "fresh-renders", "eu-west-1", BucketAttribute::AwsS3RenderBucket)
            .await
            .unwrap();

        assert_eq!(created.bucket_name, "fresh-renders");
        assert_eq!(created.location.as_deref(), Some("/fresh-renders"));
        assert_eq!(store.bucket_region("fresh-renders").as_deref(), Some("eu-west-1"));
        assert_eq!(settings.get(1).unwrap().aws_s3_render_bucket, "renders");
    }

    #[tokio::test]
    async fn already_owned_bucket_is_associated_with_settings() {
        let store = MemoryStore::new().owning("my-projects");
        let settings = MemorySettings::with(vec![crate::testing::sample_settings(5)]);

        let result = BucketManager::new(&store, &settings)
            .create_bucket(5, "my-projects", "us-west-2", BucketAttribute::AwsS3ProjectBucket)
            .await
            .unwrap();

        assert_eq!(
            result,
            BucketResponse {
                bucket_name: "my-projects".into(),
                location: None
            }
        );
        assert_eq!(settings.get(5).unwrap().aws_s3_project_bucket, "my-projects");
    }

    #[tokio::test]
    async fn already_owned_bucket_without_settings_row_is_not_found() {
        let store = MemoryStore::new().owning("my-projects");
        let settings = MemorySettings::default();

        let err = BucketManager::new(&store, &settings)
            .create_bucket(9, "my-projects", "us-west-2", BucketAttribute::AwsS3ProjectBucket)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn already_owned_bucket_with_broken_database_is_a_persistence_error() {
        let store = MemoryStore::new().owning("my-projects");
        let settings = MemorySettings::failing();

        let err = BucketManager::new(&store, &settings)
            .create_bucket(1, "my-projects", "us-west-2", BucketAttribute::AwsS3ProjectBucket)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn other_provider_errors_are_surfaced() {
        let store = MemoryStore::new().failing_create("BucketAlreadyExists");
        let settings = MemorySettings::with(vec![crate::testing::sample_settings(1)]);

        let err = BucketManager::new(&store, &settings)
            .create_bucket(1, "taken", "us-west-2", BucketAttribute::AwsS3ProjectBucket)
            .await
            .unwrap_err();

        match err {
            AppError::Provider(e) => assert_eq!(e.code(), Some("BucketAlreadyExists")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(settings.get(1).unwrap().aws_s3_project_bucket, "projects");
    }

    #[tokio::test]
    async fn removing_a_bucket_clears_the_attribute() {
        let store = MemoryStore::new();
        let settings = MemorySettings::with(vec![crate::testing::sample_settings(1)]);
        let manager = BucketManager::new(&store, &settings);

        manager
            .create_bucket(1, "renders", "us-west-2", BucketAttribute::AwsS3RenderBucket)
            .await
            .unwrap();
        let removed = manager
            .remove_bucket(1, "renders", "us-west-2", BucketAttribute::AwsS3RenderBucket)
            .await
            .unwrap();

        assert_eq!(removed, "renders");
        assert!(store.bucket_region("renders").is_none());
        assert_eq!(settings.get(1).unwrap().aws_s3_render_bucket, "");
    }

    #[tokio::test]
    async fn failed_deletion_leaves_settings_unchanged() {
        let store = MemoryStore::new().failing_delete("BucketNotEmpty");
        let settings = MemorySettings::with(vec![crate::testing::sample_settings(1)]);

        let err = BucketManager::new(&store, &settings)
            .remove_bucket(1, "renders", "us-west-2", BucketAttribute::AwsS3RenderBucket)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Provider(_)));
        assert_eq!(settings.get(1).unwrap().aws_s3_render_bucket, "renders");
    }
}
