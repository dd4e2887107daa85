//! Streaming gzip upload into S3 multipart objects.
//!
//! Incoming chunks are fed through a gzip encoder; the compressed output is cut
//! into fixed-size parts. Up to `concurrent_parts` part uploads stay in flight
//! and are polled alongside the source, so reading and uploading overlap.
//! Progress is exposed as a stream of [`UploadEvent`]s that ends with exactly
//! one [`UploadEvent::Uploaded`] or an error.
//!
//! The multipart upload is aborted whenever the pipeline stops early: on error,
//! on cancellation, when the session deadline passes, or when the consumer
//! drops the stream.

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, Stream, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::config::settings::{MIN_PART_SIZE, UploadConfig};
use crate::infrastructure::storage::{CompletedUpload, ObjectStore, ObjectTarget, StorageError, UploadedPart};

pub const DEFAULT_CONCURRENT_PARTS: usize = 1;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Upload stream interrupted: {0}")]
    Source(String),

    #[error("Compression failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Filesize exceeded: {received}/{max}.")]
    TooLarge { received: u64, max: u64 },

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Upload exceeded the maximum session duration of {0:?}")]
    TimedOut(Duration),

    #[error("Upload finished without a result")]
    Incomplete,
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Compressed bytes per part. Defaults to the S3 minimum.
    pub max_part_size: Option<usize>,
    /// Parts uploaded at the same time. Defaults to one.
    pub concurrent_parts: Option<usize>,
    /// Uncompressed bytes accepted from the source before giving up.
    pub max_bytes: Option<u64>,
    pub session_timeout: Duration,
}

impl UploadOptions {
    fn part_size(&self) -> usize {
        self.max_part_size.unwrap_or(MIN_PART_SIZE).max(1)
    }

    fn concurrency(&self) -> usize {
        self.concurrent_parts.unwrap_or(DEFAULT_CONCURRENT_PARTS).max(1)
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for UploadOptions {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_part_size: config.max_part_size,
            concurrent_parts: config.concurrent_parts,
            max_bytes: Some(config.max_bytes),
            session_timeout: config.session_timeout,
        }
    }
}

/// One completed part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartProgress {
    #[serde(rename = "ETag")]
    pub e_tag: String,
    #[serde(rename = "PartNumber")]
    pub part_number: i32,
    /// Compressed bytes handed to storage so far.
    #[serde(rename = "receivedSize")]
    pub received_size: u64,
    /// Compressed bytes acknowledged by storage so far.
    #[serde(rename = "uploadedSize")]
    pub uploaded_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UploadedObject {
    pub location: String,
    pub bucket: String,
    pub key: String,
    #[serde(rename = "ETag")]
    pub e_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Part(PartProgress),
    Uploaded(UploadedObject),
}

/// `renders/scene.blend` becomes `scene.gz`.
pub fn object_key_for(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");
    format!("{stem}.gz")
}

type PartFuture = BoxFuture<'static, Result<(UploadedPart, u64), StorageError>>;

/// Whichever came first: a part upload finishing or the next source chunk.
enum Step<C> {
    Finished(Option<Result<(UploadedPart, u64), StorageError>>),
    Chunk(Option<C>),
}

/// An open multipart upload. Dropping it before completion aborts it.
struct MultipartSession {
    store: Arc<dyn ObjectStore>,
    target: ObjectTarget,
    upload_id: String,
    finished: bool,
}

impl MultipartSession {
    async fn begin(store: Arc<dyn ObjectStore>, target: ObjectTarget) -> Result<Self, StorageError> {
        let upload_id = store.create_multipart_upload(&target).await?;
        info!(
            "Started multipart upload {} for {}/{}",
            upload_id, target.bucket, target.key
        );

        Ok(Self {
            store,
            target,
            upload_id,
            finished: false,
        })
    }

    fn upload_part(&self, part_number: i32, body: Bytes) -> PartFuture {
        let store = self.store.clone();
        let target = self.target.clone();
        let upload_id = self.upload_id.clone();

        async move {
            let size = body.len() as u64;
            let part = store.upload_part(&target, &upload_id, part_number, body).await?;
            Ok((part, size))
        }
        .boxed()
    }

    async fn complete(mut self, parts: Vec<UploadedPart>) -> Result<CompletedUpload, StorageError> {
        let completed = self
            .store
            .complete_multipart_upload(&self.target, &self.upload_id, parts)
            .await?;
        self.finished = true;
        Ok(completed)
    }
}

impl Drop for MultipartSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let store = self.store.clone();
        let target = self.target.clone();
        let upload_id = self.upload_id.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match store.abort_multipart_upload(&target, &upload_id).await {
                        Ok(()) => warn!("Aborted multipart upload {} for {}", upload_id, target.key),
                        Err(e) => error!("Failed to abort multipart upload {}: {}", upload_id, e),
                    }
                });
            }
            Err(_) => error!(
                "No runtime available to abort multipart upload {}",
                self.upload_id
            ),
        }
    }
}

/// Cancellation token plus session deadline, applied to every await point.
struct Limits {
    cancel: CancellationToken,
    deadline: Instant,
    timeout: Duration,
}

impl Limits {
    async fn run<F: Future>(&self, fut: F) -> Result<F::Output, UploadError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(UploadError::Cancelled),
            () = tokio::time::sleep_until(self.deadline) => Err(UploadError::TimedOut(self.timeout)),
            out = fut => Ok(out),
        }
    }
}

fn take_part(encoder: &mut GzEncoder<Vec<u8>>, part_size: usize) -> Bytes {
    let buffer = encoder.get_mut();
    let rest = buffer.split_off(part_size);
    Bytes::from(std::mem::replace(buffer, rest))
}

fn record_part(
    part: UploadedPart,
    size: u64,
    parts: &mut Vec<UploadedPart>,
    uploaded_size: &mut u64,
    received_size: u64,
) -> PartProgress {
    *uploaded_size += size;
    let progress = PartProgress {
        e_tag: part.e_tag.clone(),
        part_number: part.part_number,
        received_size,
        uploaded_size: *uploaded_size,
    };
    parts.push(part);
    progress
}

/// Compresses `source` into `target`, yielding a progress record per part.
///
/// The stream is lazy: nothing happens until it is polled, and it cannot be
/// restarted once finished.
pub fn upload_compressed<'a, S, E>(
    store: Arc<dyn ObjectStore>,
    source: S,
    target: ObjectTarget,
    options: UploadOptions,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<UploadEvent, UploadError>> + Send + 'a
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'a,
    E: std::fmt::Display + Send + 'a,
{
    try_stream! {
        let part_size = options.part_size();
        let concurrency = options.concurrency();
        let limits = Limits {
            cancel,
            deadline: Instant::now() + options.session_timeout,
            timeout: options.session_timeout,
        };

        let session = limits
            .run(MultipartSession::begin(store.clone(), target.clone()))
            .await??;

        let mut source = std::pin::pin!(source);
        let mut encoder = GzEncoder::new(Vec::with_capacity(part_size), Compression::default());
        let mut in_flight: FuturesUnordered<PartFuture> = FuturesUnordered::new();
        let mut parts: Vec<UploadedPart> = Vec::new();
        let mut next_part_number = 1;
        let mut raw_size = 0u64;
        let mut received_size = 0u64;
        let mut uploaded_size = 0u64;

        loop {
            // Parts in flight keep progressing while the next chunk is awaited.
            let step = limits
                .run(async {
                    tokio::select! {
                        finished = in_flight.next(), if !in_flight.is_empty() => Step::Finished(finished),
                        chunk = source.next() => Step::Chunk(chunk),
                    }
                })
                .await?;

            let chunk = match step {
                Step::Finished(Some(finished)) => {
                    let (part, size) = finished?;
                    let progress = record_part(part, size, &mut parts, &mut uploaded_size, received_size);
                    yield UploadEvent::Part(progress);
                    continue;
                }
                Step::Finished(None) => continue,
                Step::Chunk(None) => break,
                Step::Chunk(Some(chunk)) => chunk.map_err(|e| UploadError::Source(e.to_string()))?,
            };

            raw_size += chunk.len() as u64;
            if let Some(max) = options.max_bytes {
                if raw_size > max {
                    Err::<(), _>(UploadError::TooLarge { received: raw_size, max })?;
                }
            }

            encoder.write_all(&chunk)?;

            while encoder.get_ref().len() >= part_size {
                if in_flight.len() >= concurrency {
                    if let Some((part, size)) = limits.run(in_flight.next()).await?.transpose()? {
                        let progress = record_part(part, size, &mut parts, &mut uploaded_size, received_size);
                        yield UploadEvent::Part(progress);
                    }
                }

                let body = take_part(&mut encoder, part_size);
                received_size += body.len() as u64;
                in_flight.push(session.upload_part(next_part_number, body));
                next_part_number += 1;
            }
        }

        let remainder = encoder.finish()?;
        for chunk in remainder.chunks(part_size) {
            if in_flight.len() >= concurrency {
                if let Some((part, size)) = limits.run(in_flight.next()).await?.transpose()? {
                    let progress = record_part(part, size, &mut parts, &mut uploaded_size, received_size);
                    yield UploadEvent::Part(progress);
                }
            }

            let body = Bytes::copy_from_slice(chunk);
            received_size += body.len() as u64;
            in_flight.push(session.upload_part(next_part_number, body));
            next_part_number += 1;
        }

        while let Some((part, size)) = limits.run(in_flight.next()).await?.transpose()? {
            let progress = record_part(part, size, &mut parts, &mut uploaded_size, received_size);
            yield UploadEvent::Part(progress);
        }

        parts.sort_by_key(|p| p.part_number);
        let completed = limits.run(session.complete(parts)).await??;

        let uploaded = UploadedObject {
            location: completed
                .location
                .unwrap_or_else(|| store.object_url(&target)),
            bucket: target.bucket.clone(),
            key: target.key.clone(),
            e_tag: completed.e_tag.unwrap_or_default(),
        };

        info!(
            "Uploaded {} ({} bytes in, {} bytes stored)",
            uploaded.location, raw_size, uploaded_size
        );
        yield UploadEvent::Uploaded(uploaded);
    }
}

/// Consumes an upload stream, logging each part, and returns the final object.
pub async fn drive<S>(events: S) -> Result<UploadedObject, UploadError>
where
    S: Stream<Item = Result<UploadEvent, UploadError>>,
{
    let mut events = std::pin::pin!(events);
    let mut uploaded = None;

    while let Some(event) = events.next().await {
        match event? {
            UploadEvent::Part(progress) => info!(
                "Part {} uploaded (ETag {}, received {}, uploaded {})",
                progress.part_number, progress.e_tag, progress.received_size, progress.uploaded_size
            ),
            UploadEvent::Uploaded(object) => uploaded = Some(object),
        }
    }

    uploaded.ok_or(UploadError::Incomplete)
}

/// Gzips `source` into `<bucket>/<file stem>.gz` and waits for completion.
pub async fn create_zip_and_upload_to_s3<S, E>(
    store: Arc<dyn ObjectStore>,
    source: S,
    file_name: &str,
    bucket: &str,
    options: UploadOptions,
    cancel: CancellationToken,
) -> Result<UploadedObject, UploadError>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: std::fmt::Display + Send,
{
    let target = ObjectTarget {
        bucket: bucket.to_string(),
        key: object_key_for(file_name),
    };
    info!("Starting upload of {} to {}/{}", file_name, target.bucket, target.key);

    drive(upload_compressed(store, source, target, options, cancel)).await
}
