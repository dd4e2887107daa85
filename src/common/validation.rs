use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::config::settings::DEFAULT_UPLOAD_MAX_BYTES;

/// Content types accepted for render-job uploads.
pub const ALLOWED_TYPES: &[&str] = &[
    "application/zip",
    "application/octet-stream",
    "application/x-gzip",
    "multipart/x-gzip",
    "multipart/x-zip",
    "application/blender",
];

#[derive(Debug, Clone)]
pub struct UploadRules {
    pub allowed_types: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadRules {
    fn default() -> Self {
        Self {
            allowed_types: ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
            max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        }
    }
}

impl UploadRules {
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }
}

/// What the client declared about a file before any of it is read.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub byte_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationIssue {
    pub message: String,
}

/// Checks the declared content type and size. An empty list means the file is accepted.
pub fn validate(file: &IncomingFile, rules: &UploadRules) -> Vec<ValidationIssue> {
    debug!("Validating file {}...", file.file_name);

    let mut errors = Vec::new();

    let essence = file
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());

    let type_allowed = essence
        .as_deref()
        .is_some_and(|ct| rules.allowed_types.iter().any(|allowed| allowed == ct));

    if !type_allowed {
        errors.push(ValidationIssue {
            message: format!(
                "Wrong filetype ({}).",
                file.content_type.as_deref().unwrap_or("unknown")
            ),
        });
    }

    if file.byte_count > rules.max_bytes {
        errors.push(ValidationIssue {
            message: format!("Filesize exceeded: {}/{}.", file.byte_count, rules.max_bytes),
        });
    }

    if !errors.is_empty() {
        debug!("File {} rejected: {:?}", file.file_name, errors);
    }

    errors
}
