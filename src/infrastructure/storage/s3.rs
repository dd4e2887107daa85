use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketCannedAcl, BucketLocationConstraint, CompletedMultipartUpload, CompletedPart,
    CreateBucketConfiguration, ObjectCannedAcl, StorageClass,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, info};

use super::{CompletedUpload, ObjectStore, ObjectTarget, StorageError, UploadedPart};
use crate::config::credentials::AwsKeyPair;
use crate::config::settings::AwsConfig;

const GZIP_CONTENT_TYPE: &str = "application/gzip";

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    endpoint: Option<String>,
}

impl StorageService {
    pub fn new(aws: &AwsConfig, keys: &AwsKeyPair) -> Self {
        let credentials = Credentials::new(
            &keys.aws_access_key_id,
            &keys.aws_secret_access_key,
            None,
            None,
            "brenda-console",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(aws.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &aws.endpoint {
            // MinIO and friends only understand path-style requests.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!(
            "✅ S3 client ready (region {}, endpoint {})",
            aws.region,
            aws.endpoint.as_deref().unwrap_or("aws")
        );

        Self {
            client,
            endpoint: aws.endpoint.clone(),
        }
    }

    /// Bucket operations must be signed for the bucket's own region.
    fn client_for(&self, region: &str) -> Client {
        let conf = self
            .client
            .config()
            .to_builder()
            .region(Region::new(region.to_string()))
            .build();
        Client::from_conf(conf)
    }
}

fn provider_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);

    match err.message() {
        Some(message) => StorageError::Provider {
            operation,
            code,
            message: message.to_string(),
        },
        None => {
            let mut parsed = StorageError::from_raw(operation, &DisplayErrorContext(&err).to_string());
            if let StorageError::Provider { code: parsed_code, .. } = &mut parsed {
                if parsed_code.is_none() {
                    *parsed_code = code;
                }
            }
            parsed
        }
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<Option<String>, StorageError> {
        let mut request = self
            .client_for(region)
            .create_bucket()
            .bucket(bucket)
            .acl(BucketCannedAcl::AuthenticatedRead);

        // us-east-1 is the default location and rejects an explicit constraint.
        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(output) => Ok(output.location().map(str::to_string)),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_bucket_already_owned_by_you())
                {
                    return Err(StorageError::BucketAlreadyOwned {
                        bucket: bucket.to_string(),
                    });
                }
                Err(provider_error("CreateBucket", err))
            }
        }
    }

    async fn delete_bucket(&self, bucket: &str, region: &str) -> Result<(), StorageError> {
        self.client_for(region)
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| provider_error("DeleteBucket", e))?;

        Ok(())
    }

    async fn create_multipart_upload(&self, target: &ObjectTarget) -> Result<String, StorageError> {
        let result = self
            .client
            .create_multipart_upload()
            .bucket(&target.bucket)
            .key(&target.key)
            .acl(ObjectCannedAcl::AuthenticatedRead)
            .storage_class(StorageClass::ReducedRedundancy)
            .content_type(GZIP_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| provider_error("CreateMultipartUpload", e))?;

        result
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| StorageError::from_raw("CreateMultipartUpload", "response carried no upload id"))
    }

    async fn upload_part(
        &self,
        target: &ObjectTarget,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<UploadedPart, StorageError> {
        let result = self
            .client
            .upload_part()
            .bucket(&target.bucket)
            .key(&target.key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| provider_error("UploadPart", e))?;

        let e_tag = result
            .e_tag()
            .ok_or_else(|| StorageError::from_raw("UploadPart", "response carried no ETag"))?;

        Ok(UploadedPart {
            part_number,
            e_tag: e_tag.to_string(),
        })
    }

    async fn complete_multipart_upload(
        &self,
        target: &ObjectTarget,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> Result<CompletedUpload, StorageError> {
        let parts = parts
            .into_iter()
            .map(|part| {
                CompletedPart::builder()
                    .e_tag(part.e_tag)
                    .part_number(part.part_number)
                    .build()
            })
            .collect::<Vec<_>>();

        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        let result = self
            .client
            .complete_multipart_upload()
            .bucket(&target.bucket)
            .key(&target.key)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await
            .map_err(|e| provider_error("CompleteMultipartUpload", e))?;

        Ok(CompletedUpload {
            location: result.location().map(str::to_string),
            e_tag: result.e_tag().map(str::to_string),
        })
    }

    async fn abort_multipart_upload(&self, target: &ObjectTarget, upload_id: &str) -> Result<(), StorageError> {
        debug!("Aborting multipart upload {} for {}/{}", upload_id, target.bucket, target.key);

        self.client
            .abort_multipart_upload()
            .bucket(&target.bucket)
            .key(&target.key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| provider_error("AbortMultipartUpload", e))?;

        Ok(())
    }

    fn object_url(&self, target: &ObjectTarget) -> String {
        match &self.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                target.bucket,
                target.key
            ),
            None => format!("https://{}.s3.amazonaws.com/{}", target.bucket, target.key),
        }
    }
}
