use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{FileRecord, NewFileRecord};

const FILE_COLUMNS: &str = "id, job_id, upload_name, extension, original_name, content_type, upload_size, \
     aws_s3_location, aws_s3_bucket, aws_s3_etag, uploaded_by, created_at";

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn insert_file(&self, file: NewFileRecord) -> Result<FileRecord, sqlx::Error>;
}

pub struct FileRepository;

impl FileRepository {
    pub async fn create(pool: &PgPool, file: &NewFileRecord) -> Result<FileRecord, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(&format!(
            r#"
            INSERT INTO files (
                job_id, upload_name, extension, original_name, content_type, upload_size,
                aws_s3_location, aws_s3_bucket, aws_s3_etag, uploaded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(file.job_id)
        .bind(&file.upload_name)
        .bind(&file.extension)
        .bind(&file.original_name)
        .bind(&file.content_type)
        .bind(file.upload_size)
        .bind(&file.aws_s3_location)
        .bind(&file.aws_s3_bucket)
        .bind(&file.aws_s3_etag)
        .bind(file.uploaded_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<FileRecord>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE job_id = $1 ORDER BY created_at ASC"
        ))
        .bind(job_id)
        .fetch_all(pool)
        .await
    }
}

#[async_trait]
impl FileStore for PgPool {
    async fn insert_file(&self, file: NewFileRecord) -> Result<FileRecord, sqlx::Error> {
        FileRepository::create(self, &file).await
    }
}
