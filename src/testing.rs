//! In-memory stand-ins for the storage and database seams.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::infrastructure::storage::{CompletedUpload, ObjectStore, ObjectTarget, StorageError, UploadedPart};
use crate::modules::jobs::model::Job;
use crate::modules::jobs::repository::JobStore;
use crate::modules::settings::model::{BucketAttribute, Settings};
use crate::modules::settings::repository::SettingsStore;
use crate::modules::uploads::model::{FileRecord, NewFileRecord};
use crate::modules::uploads::repository::FileStore;

pub fn sample_settings(id: i32) -> Settings {
    Settings {
        id,
        email: "ops@example.com".into(),
        ami_id: "ami-0abc".into(),
        instance_type: "c4.large".into(),
        aws_ec2_region: "us-west-2".into(),
        aws_sqs_region: "us-west-2".into(),
        aws_s3_region: "us-west-2".into(),
        ec2_instance_count: 2,
        aws_s3_project_bucket: "projects".into(),
        aws_s3_render_bucket: "renders".into(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn sample_job(owner_id: Uuid) -> Job {
    Job {
        id: Uuid::new_v4(),
        name: "shot-010".into(),
        animation_start_frame: 1,
        animation_end_frame: 240,
        animation_total_frames: 240,
        animation_jump_frames: 1,
        instance_type: "c4.large".into(),
        ami_id: "ami-0abc".into(),
        aws_ec2_region: "us-west-2".into(),
        aws_sqs_region: "us-west-2".into(),
        aws_ec2_instance_count: 2,
        max_spend_amount: 0.0,
        queue_id: None,
        owner_id,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

fn provider_error(operation: &'static str, code: &str) -> StorageError {
    StorageError::Provider {
        operation,
        code: Some(code.to_string()),
        message: format!("{code} (injected)"),
    }
}

struct PendingUpload {
    target: ObjectTarget,
    parts: BTreeMap<i32, Bytes>,
}

struct StoredObject {
    data: Vec<u8>,
    parts: usize,
}

#[derive(Default)]
struct StoreState {
    buckets: HashMap<String, String>,
    pending: HashMap<String, PendingUpload>,
    objects: HashMap<(String, String), StoredObject>,
    aborted: Vec<String>,
    started: usize,
    calls: Vec<&'static str>,
    next_id: u64,
}

/// Object store that keeps buckets and multipart uploads in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    owned: HashSet<String>,
    fail_create: Option<String>,
    fail_delete: Option<String>,
    fail_part: Option<i32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creating `bucket` reports that the caller already owns it.
    pub fn owning(mut self, bucket: &str) -> Self {
        self.owned.insert(bucket.to_string());
        self
    }

    pub fn failing_create(mut self, code: &str) -> Self {
        self.fail_create = Some(code.to_string());
        self
    }

    pub fn failing_delete(mut self, code: &str) -> Self {
        self.fail_delete = Some(code.to_string());
        self
    }

    pub fn failing_part(mut self, part_number: i32) -> Self {
        self.fail_part = Some(part_number);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn bucket_region(&self, bucket: &str) -> Option<String> {
        self.lock().buckets.get(bucket).cloned()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.data.clone())
    }

    pub fn part_count(&self, bucket: &str, key: &str) -> usize {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map_or(0, |o| o.parts)
    }

    pub fn aborted(&self) -> Vec<String> {
        self.lock().aborted.clone()
    }

    pub async fn wait_for_aborts(&self, count: usize) {
        eventually("multipart aborts", || self.lock().aborted.len() >= count).await;
    }

    pub async fn wait_for_uploads_started(&self, count: usize) {
        eventually("multipart uploads", || self.lock().started >= count).await;
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<Option<String>, StorageError> {
        self.lock().calls.push("CreateBucket");

        if let Some(code) = &self.fail_create {
            return Err(provider_error("CreateBucket", code));
        }
        if self.owned.contains(bucket) {
            return Err(StorageError::BucketAlreadyOwned {
                bucket: bucket.to_string(),
            });
        }

        self.lock().buckets.insert(bucket.to_string(), region.to_string());
        Ok(Some(format!("/{bucket}")))
    }

    async fn delete_bucket(&self, bucket: &str, _region: &str) -> Result<(), StorageError> {
        self.lock().calls.push("DeleteBucket");

        if let Some(code) = &self.fail_delete {
            return Err(provider_error("DeleteBucket", code));
        }
        self.lock().buckets.remove(bucket);
        Ok(())
    }

    async fn create_multipart_upload(&self, target: &ObjectTarget) -> Result<String, StorageError> {
        let mut state = self.lock();
        state.calls.push("CreateMultipartUpload");
        state.next_id += 1;
        state.started += 1;

        let upload_id = format!("upload-{}", state.next_id);
        state.pending.insert(
            upload_id.clone(),
            PendingUpload {
                target: target.clone(),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        _target: &ObjectTarget,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<UploadedPart, StorageError> {
        // Lets concurrent parts finish out of order.
        tokio::task::yield_now().await;

        if self.fail_part == Some(part_number) {
            return Err(provider_error("UploadPart", "InternalError"));
        }

        let mut state = self.lock();
        let pending = state
            .pending
            .get_mut(upload_id)
            .ok_or_else(|| provider_error("UploadPart", "NoSuchUpload"))?;
        pending.parts.insert(part_number, body);

        Ok(UploadedPart {
            part_number,
            e_tag: format!("\"etag-{part_number}\""),
        })
    }

    async fn complete_multipart_upload(
        &self,
        _target: &ObjectTarget,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> Result<CompletedUpload, StorageError> {
        let mut state = self.lock();
        let pending = state
            .pending
            .remove(upload_id)
            .ok_or_else(|| provider_error("CompleteMultipartUpload", "NoSuchUpload"))?;

        let mut data = Vec::new();
        for part in &parts {
            let body = pending
                .parts
                .get(&part.part_number)
                .ok_or_else(|| provider_error("CompleteMultipartUpload", "InvalidPart"))?;
            data.extend_from_slice(body);
        }

        let key = (pending.target.bucket.clone(), pending.target.key.clone());
        state.objects.insert(
            key,
            StoredObject {
                data,
                parts: parts.len(),
            },
        );

        Ok(CompletedUpload {
            location: None,
            e_tag: Some(format!("\"memory-{}\"", parts.len())),
        })
    }

    async fn abort_multipart_upload(&self, _target: &ObjectTarget, upload_id: &str) -> Result<(), StorageError> {
        let mut state = self.lock();
        state.pending.remove(upload_id);
        state.aborted.push(upload_id.to_string());
        Ok(())
    }
}

/// Settings rows keyed by id.
#[derive(Default)]
pub struct MemorySettings {
    rows: Mutex<HashMap<i32, Settings>>,
    failing: bool,
}

impl MemorySettings {
    pub fn with(rows: Vec<Settings>) -> Self {
        Self {
            rows: Mutex::new(rows.into_iter().map(|s| (s.id, s)).collect()),
            failing: false,
        }
    }

    /// Every query fails as if the pool were exhausted.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn get(&self, id: i32) -> Option<Settings> {
        self.rows.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn current_settings(&self) -> Result<Option<Settings>, sqlx::Error> {
        if self.failing {
            return Err(sqlx::Error::PoolTimedOut);
        }

        let rows = self.rows.lock().unwrap();
        Ok(rows.values().min_by_key(|s| s.id).cloned())
    }

    async fn set_bucket_attribute(
        &self,
        id: i32,
        attribute: BucketAttribute,
        value: &str,
    ) -> Result<Option<Settings>, sqlx::Error> {
        if self.failing {
            return Err(sqlx::Error::PoolTimedOut);
        }

        let mut rows = self.rows.lock().unwrap();
        Ok(rows.get_mut(&id).map(|settings| {
            settings.set_bucket(attribute, value);
            settings.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryJobs {
    rows: HashMap<Uuid, Job>,
}

impl MemoryJobs {
    pub fn with(jobs: Vec<Job>) -> Self {
        Self {
            rows: jobs.into_iter().map(|j| (j.id, j)).collect(),
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobs {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        Ok(self.rows.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryFiles {
    rows: Mutex<Vec<FileRecord>>,
    failing: bool,
}

impl MemoryFiles {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn all(&self) -> Vec<FileRecord> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for MemoryFiles {
    async fn insert_file(&self, file: NewFileRecord) -> Result<FileRecord, sqlx::Error> {
        if self.failing {
            return Err(sqlx::Error::PoolTimedOut);
        }

        let record = FileRecord {
            id: Uuid::new_v4(),
            job_id: file.job_id,
            upload_name: file.upload_name,
            extension: file.extension,
            original_name: file.original_name,
            content_type: file.content_type,
            upload_size: file.upload_size,
            aws_s3_location: file.aws_s3_location,
            aws_s3_bucket: file.aws_s3_bucket,
            aws_s3_etag: file.aws_s3_etag,
            uploaded_by: file.uploaded_by,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }
}
