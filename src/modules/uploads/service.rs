use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, StreamExt, TryStreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::DiskFile;
use super::model::{FileRecord, NewFileRecord, UploadDescriptor};
use super::repository::{FileRepository, FileStore};
use crate::common::error::{AppError, AppResult};
use crate::common::upload::{self, UploadOptions, UploadedObject};
use crate::common::validation::{self, IncomingFile, UploadRules};
use crate::infrastructure::storage::ObjectStore;
use crate::modules::auth::dto::TokenClaims;
use crate::modules::jobs::repository::JobStore;
use crate::modules::jobs::service::can_access;
use crate::modules::settings::repository::SettingsStore;
use crate::state::AppState;

pub const DOWNLOAD_ROUTE: &str = "/api/v1/uploads/download";

/// Room left for multipart boundaries and part headers around the file itself.
pub const MULTIPART_FRAMING_ALLOWANCE: u64 = 64 * 1024;

/// `projects/scene.tar.gz` becomes `scene`.
pub fn stored_upload_name(key: &str) -> String {
    let base = key.rsplit('/').next().unwrap_or(key);
    base.split('.').next().unwrap_or(base).to_string()
}

/// `projects/scene.gz` becomes `.gz`; keys without an extension give an empty string.
pub fn stored_extension(key: &str) -> String {
    Path::new(key)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

pub fn strip_etag(e_tag: &str) -> String {
    e_tag.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

/// Persists the metadata of a completed upload for `user_id`.
pub async fn create_file_record(
    store: &dyn FileStore,
    user_id: Uuid,
    upload: &UploadDescriptor,
    aws_data: &UploadedObject,
    job_id: Option<Uuid>,
) -> AppResult<FileRecord> {
    if user_id.is_nil() {
        return Err(AppError::validation("You must provide a user id."));
    }
    if aws_data.key.is_empty() || aws_data.location.is_empty() {
        return Err(AppError::validation("Not a valid upload result."));
    }

    let file = NewFileRecord {
        job_id,
        upload_name: stored_upload_name(&aws_data.key),
        extension: stored_extension(&aws_data.key),
        original_name: upload.original_name().to_string(),
        content_type: upload.content_type().to_string(),
        upload_size: i64::try_from(upload.size()).unwrap_or(i64::MAX),
        aws_s3_location: aws_data.location.clone(),
        aws_s3_bucket: aws_data.bucket.clone(),
        aws_s3_etag: strip_etag(&aws_data.e_tag),
        uploaded_by: user_id,
    };

    let record = store.insert_file(file).await?;
    info!("Recorded upload {} ({}) for user {}", record.upload_name, record.id, user_id);
    Ok(record)
}

/// Last path component of a client-supplied name, rejecting anything that
/// could address another directory.
pub fn safe_file_name(name: &str) -> AppResult<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(AppError::validation(format!("Invalid file name ({name}).")));
    }
    Ok(base.to_string())
}

/// Joins `requested` onto `root`, refusing absolute paths and `..` segments.
pub fn resolve_download_path(root: &Path, requested: &str) -> AppResult<PathBuf> {
    let relative = Path::new(requested);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if requested.is_empty() || escapes {
        warn!("Rejected download path {}", requested);
        return Err(AppError::NotFound(format!("File {requested} not found")));
    }

    Ok(root.join(relative))
}

/// Name a disk upload is stored under: a fresh id that keeps the client's extension.
fn disk_storage_name(original: &str) -> String {
    match Path::new(original).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}.{ext}", Uuid::new_v4()),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Streams `source` into a new file under `dir`. `used` bytes of the request
/// budget `max` are already spent by earlier files. Existing files are never
/// overwritten.
pub async fn save_to_disk<S, E>(
    dir: &Path,
    file_name: &str,
    source: S,
    used: u64,
    max: u64,
) -> AppResult<DiskFile>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let name = safe_file_name(file_name)?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create {}: {}", dir.display(), e)))?;

    let stored = disk_storage_name(&name);
    let path = dir.join(&stored);
    let io_error = |e: std::io::Error| AppError::Internal(anyhow::anyhow!("Failed to write {}: {}", name, e));

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(io_error)?;
    let mut source = std::pin::pin!(source);
    let mut size = 0u64;

    let outcome: AppResult<()> = async {
        while let Some(chunk) = source.next().await {
            let chunk = chunk.map_err(|e| AppError::validation(format!("Upload interrupted: {e}")))?;
            size += chunk.len() as u64;
            if used + size > max {
                return Err(AppError::validation(format!("Filesize exceeded: {}/{}.", used + size, max)));
            }
            file.write_all(&chunk).await.map_err(io_error)?;
        }
        file.flush().await.map_err(io_error)
    }
    .await;

    if let Err(e) = outcome {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove partial upload {}: {}", path.display(), remove_err);
        }
        return Err(e);
    }

    info!("Saved {} as {} ({} bytes) in {}", name, stored, size, dir.display());

    let url = format!("{DOWNLOAD_ROUTE}/{stored}");
    Ok(DiskFile {
        name,
        size,
        thumbnail_url: url.clone(),
        url,
    })
}

/// One upload to the project bucket: settings check, job access, validation,
/// compression into S3, then the file record.
pub struct S3Upload<'a> {
    storage: Arc<dyn ObjectStore>,
    settings: &'a dyn SettingsStore,
    jobs: &'a dyn JobStore,
    files: &'a dyn FileStore,
    options: UploadOptions,
    cancel: CancellationToken,
}

impl<'a> S3Upload<'a> {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        settings: &'a dyn SettingsStore,
        jobs: &'a dyn JobStore,
        files: &'a dyn FileStore,
        options: UploadOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            storage,
            settings,
            jobs,
            files,
            options,
            cancel,
        }
    }

    fn rules(&self) -> UploadRules {
        match self.options.max_bytes {
            Some(max_bytes) => UploadRules::with_max_bytes(max_bytes),
            None => UploadRules::default(),
        }
    }

    /// Nothing reaches storage until every check has passed. The recorded
    /// size is the raw byte count actually received.
    pub async fn run<S, E>(
        &self,
        claims: &TokenClaims,
        job_id: Option<Uuid>,
        incoming: IncomingFile,
        source: S,
    ) -> AppResult<FileRecord>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::fmt::Display + Send,
    {
        let settings = self
            .settings
            .current_settings()
            .await?
            .ok_or_else(|| AppError::validation("You must save your settings before uploading."))?;
        let bucket = settings.aws_s3_project_bucket;
        if bucket.is_empty() {
            return Err(AppError::validation("You must create a project bucket before uploading."));
        }

        if let Some(job_id) = job_id {
            self.jobs
                .find_job(job_id)
                .await?
                .filter(|job| can_access(job, claims))
                .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
        }

        let issues = validation::validate(&incoming, &self.rules());
        if !issues.is_empty() {
            return Err(AppError::Validation(issues.into_iter().map(|i| i.message).collect()));
        }

        let mut received = 0u64;
        let counted = source.inspect_ok(|chunk| received += chunk.len() as u64);

        let object = upload::create_zip_and_upload_to_s3(
            self.storage.clone(),
            counted,
            &incoming.file_name,
            &bucket,
            self.options.clone(),
            self.cancel.clone(),
        )
        .await?;

        let descriptor = UploadDescriptor::Stream {
            upload_name: incoming.file_name,
            content_type: incoming.content_type.unwrap_or_default(),
            byte_count: received,
        };

        create_file_record(self.files, claims.sub, &descriptor, &object, job_id).await
    }
}

pub struct UploadService;

impl UploadService {
    pub async fn upload_to_s3<S, E>(
        state: AppState,
        claims: &TokenClaims,
        job_id: Option<Uuid>,
        incoming: IncomingFile,
        source: S,
    ) -> AppResult<FileRecord>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::fmt::Display + Send,
    {
        S3Upload::new(
            state.storage.clone(),
            &state.db,
            &state.db,
            &state.db,
            UploadOptions::from(&state.config.upload),
            state.shutdown.child_token(),
        )
        .run(claims, job_id, incoming, source)
        .await
    }

    pub async fn open_download(state: &AppState, requested: &str) -> AppResult<(tokio::fs::File, PathBuf, u64)> {
        let path = resolve_download_path(&state.config.upload_dir, requested)?;
        let not_found = || AppError::NotFound(format!("File {requested} not found"));

        let file = tokio::fs::File::open(&path).await.map_err(|_| not_found())?;
        let metadata = file.metadata().await.map_err(|_| not_found())?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        Ok((file, path, metadata.len()))
    }

    pub async fn files_for_job(state: AppState, job_id: Uuid) -> AppResult<Vec<FileRecord>> {
        Ok(FileRepository::find_by_job(&state.db, job_id).await?)
    }
}
