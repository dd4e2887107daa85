pub mod credentials;
pub mod env;
pub mod settings;
pub mod version;

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading process configuration or configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Unable to find the file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to find the Amazon Access Key in the file provided.")]
    MissingAccessKey,

    #[error("Unable to find the Amazon Secret Key in the file provided.")]
    MissingSecretKey,

    #[error("Unable to find the version in the file provided.")]
    MissingVersion,
}

impl ConfigError {
    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::MissingFile(path)
        } else {
            ConfigError::Read { path, source }
        }
    }
}
