use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::ConfigError;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"VERSION="([0-9].*)""#).expect("valid regex"));

/// Reads the Brenda version out of its `setup.py`.
pub async fn brenda_version(setup_file: &Path) -> Result<String, ConfigError> {
    let contents = tokio::fs::read_to_string(setup_file)
        .await
        .map_err(|e| ConfigError::from_io(setup_file.to_path_buf(), e))?;

    parse_version(&contents)
}

pub fn parse_version(contents: &str) -> Result<String, ConfigError> {
    VERSION_RE
        .captures(contents)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(ConfigError::MissingVersion)
}
