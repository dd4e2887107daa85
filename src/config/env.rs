use std::env;
use std::str::FromStr;

use super::ConfigError;

#[derive(Debug, Clone, Copy)]
pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    JwtSecret,
    AwsRegion,
    AwsEndpoint,
    AwsAccessKey,
    AwsSecretKey,
    BrendaSetupFile,
    UploadDir,
    AwsConfigOutput,
    UploadMaxBytes,
    UploadDiskMaxBytes,
    UploadMaxPartSize,
    UploadConcurrentParts,
    UploadSessionTimeout,
    Home,
    HomePath,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::JwtSecret => "JWT_SECRET",
            EnvKey::AwsRegion => "AWS_REGION",
            EnvKey::AwsEndpoint => "AWS_ENDPOINT_URL",
            EnvKey::AwsAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::AwsSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::BrendaSetupFile => "BRENDA_SETUP_FILE",
            EnvKey::UploadDir => "UPLOAD_DIR",
            EnvKey::AwsConfigOutput => "AWS_CONFIG_OUTPUT",
            EnvKey::UploadMaxBytes => "UPLOAD_MAX_BYTES",
            EnvKey::UploadDiskMaxBytes => "UPLOAD_DISK_MAX_BYTES",
            EnvKey::UploadMaxPartSize => "UPLOAD_MAX_PART_SIZE",
            EnvKey::UploadConcurrentParts => "UPLOAD_CONCURRENT_PARTS",
            EnvKey::UploadSessionTimeout => "UPLOAD_SESSION_TIMEOUT_SECS",
            EnvKey::Home => "HOME",
            EnvKey::HomePath => "HOMEPATH",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, ConfigError> {
    env::var(key.as_str()).map_err(|_| ConfigError::MissingEnv(key.as_str()))
}

/// Unset and empty values both count as absent.
pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    get_opt(key).unwrap_or_else(|| default.to_string())
}

/// Missing keys fall back to `default`; present but unparsable values are an error.
pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> Result<T, ConfigError> {
    match get_parsed_opt(key)? {
        Some(val) => Ok(val),
        None => Ok(default),
    }
}

pub fn get_parsed_opt<T: FromStr>(key: EnvKey) -> Result<Option<T>, ConfigError> {
    match get_opt(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                name: key.as_str(),
                value: raw,
            }),
        None => Ok(None),
    }
}
