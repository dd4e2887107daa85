use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::ConfigError;
use super::env::{self, EnvKey};

/// S3 rejects non-final multipart parts smaller than this.
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub aws: AwsConfig,
    pub brenda_setup_file: PathBuf,
    pub upload_dir: PathBuf,
    pub aws_config_output: PathBuf,
    pub upload: UploadConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    /// Custom endpoint (MinIO, localstack). Enables path-style addressing.
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub disk_max_bytes: u64,
    pub max_part_size: Option<usize>,
    pub concurrent_parts: Option<usize>,
    pub session_timeout: Duration,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000)?,
            database_url: env::get(EnvKey::DatabaseUrl)?,
            jwt_secret: env::get(EnvKey::JwtSecret)?,
            aws: AwsConfig {
                region: env::get_or(EnvKey::AwsRegion, "us-west-2"),
                endpoint: env::get_opt(EnvKey::AwsEndpoint),
                access_key_id: env::get_opt(EnvKey::AwsAccessKey),
                secret_access_key: env::get_opt(EnvKey::AwsSecretKey),
            },
            brenda_setup_file: env::get_or(EnvKey::BrendaSetupFile, "lib/brenda/setup.py").into(),
            upload_dir: env::get_or(EnvKey::UploadDir, "files/projects").into(),
            aws_config_output: env::get_or(EnvKey::AwsConfigOutput, "config/aws.js").into(),
            upload: UploadConfig::from_env()?,
        })
    }
}

impl UploadConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let max_part_size = env::get_parsed_opt::<usize>(EnvKey::UploadMaxPartSize)?.map(|size| {
            if size < MIN_PART_SIZE {
                warn!(
                    "{} = {} is below the S3 minimum, using {}",
                    EnvKey::UploadMaxPartSize.as_str(),
                    size,
                    MIN_PART_SIZE
                );
                MIN_PART_SIZE
            } else {
                size
            }
        });

        Ok(Self {
            max_bytes: env::get_parsed(EnvKey::UploadMaxBytes, DEFAULT_UPLOAD_MAX_BYTES)?,
            disk_max_bytes: env::get_parsed(EnvKey::UploadDiskMaxBytes, 1_000_000)?,
            max_part_size,
            concurrent_parts: env::get_parsed_opt::<usize>(EnvKey::UploadConcurrentParts)?
                .map(|n| n.max(1)),
            session_timeout: Duration::from_secs(env::get_parsed(
                EnvKey::UploadSessionTimeout,
                3600,
            )?),
        })
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            disk_max_bytes: 1_000_000,
            max_part_size: None,
            concurrent_parts: None,
            session_timeout: Duration::from_secs(3600),
        }
    }
}
