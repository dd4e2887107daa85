//! AWS shared-credentials file loader.
//!
//! Reads `<home>/.aws/credentials` and pulls the access key pair out of the
//! quoted `aws_access_key_id = "..."` / `aws_secret_access_key = "..."` lines.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use super::ConfigError;
use super::env::{self, EnvKey};

static ACCESS_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"aws_access_key_id\s*=\s*['"](.*)['"]"#).expect("valid regex"));

static SECRET_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"aws_secret_access_key\s*=\s*['"](.*)['"]"#).expect("valid regex")
});

#[derive(Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AwsKeyPair {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

impl std::fmt::Debug for AwsKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsKeyPair")
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .finish()
    }
}

/// `<home>/.aws/credentials`, using `HOMEPATH` on Windows and `HOME` elsewhere.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    let home_key = if cfg!(windows) { EnvKey::HomePath } else { EnvKey::Home };
    let home = env::get(home_key)?;
    Ok(Path::new(&home).join(".aws").join("credentials"))
}

pub async fn load() -> Result<AwsKeyPair, ConfigError> {
    let path = default_path()?;
    load_from(&path).await
}

pub async fn load_from(path: &Path) -> Result<AwsKeyPair, ConfigError> {
    debug!("Reading AWS credentials from {}", path.display());

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::from_io(path.to_path_buf(), e))?;

    let keys = parse(&contents)?;
    info!("Loaded AWS credentials for key {}", keys.aws_access_key_id);
    Ok(keys)
}

/// Both keys must be present; nothing is returned otherwise.
pub fn parse(contents: &str) -> Result<AwsKeyPair, ConfigError> {
    let aws_access_key_id = capture(&ACCESS_KEY_RE, contents).ok_or(ConfigError::MissingAccessKey)?;
    let aws_secret_access_key =
        capture(&SECRET_KEY_RE, contents).ok_or(ConfigError::MissingSecretKey)?;

    Ok(AwsKeyPair {
        aws_access_key_id,
        aws_secret_access_key,
    })
}

fn capture(re: &Regex, contents: &str) -> Option<String> {
    re.captures(contents)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_double_quoted_keys() {
        let contents = "[default]\naws_access_key_id = \"AKIA123\"\naws_secret_access_key = \"secret456\"\n";

        let keys = parse(contents).unwrap();
        assert_eq!(keys.aws_access_key_id, "AKIA123");
        assert_eq!(keys.aws_secret_access_key, "secret456");
    }

    #[test]
    fn parses_single_quoted_keys_without_spaces() {
        let contents = "aws_access_key_id='AKIAXYZ'\naws_secret_access_key='abc/def+ghi'";

        let keys = parse(contents).unwrap();
        assert_eq!(keys.aws_access_key_id, "AKIAXYZ");
        assert_eq!(keys.aws_secret_access_key, "abc/def+ghi");
    }

    #[test]
    fn missing_access_key_is_an_error() {
        let err = parse("aws_secret_access_key = \"secret456\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingAccessKey));
    }

    #[test]
    fn missing_secret_key_is_an_error() {
        let err = parse("aws_access_key_id = \"AKIA123\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecretKey));
    }

    #[test]
    fn unquoted_values_do_not_match() {
        let contents = "aws_access_key_id = AKIA123\naws_secret_access_key = secret456";
        assert!(parse(contents).is_err());
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let keys = AwsKeyPair {
            aws_access_key_id: "AKIA123".into(),
            aws_secret_access_key: "secret456".into(),
        };
        let rendered = format!("{:?}", keys);
        assert!(rendered.contains("AKIA123"));
        assert!(!rendered.contains("secret456"));
    }

    #[tokio::test]
    async fn load_from_missing_file_reports_the_path() {
        let path = std::env::temp_dir().join(format!("brenda-missing-{}", uuid::Uuid::new_v4()));

        let err = load_from(&path).await.unwrap_err();
        match err {
            ConfigError::MissingFile(p) => assert_eq!(p, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_from_reads_the_file() {
        let path = std::env::temp_dir().join(format!("brenda-credentials-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(
            &path,
            "[default]\naws_access_key_id = \"AKIA123\"\naws_secret_access_key = \"secret456\"\n",
        )
        .await
        .unwrap();

        let keys = load_from(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.ok();

        assert_eq!(
            keys,
            AwsKeyPair {
                aws_access_key_id: "AKIA123".into(),
                aws_secret_access_key: "secret456".into(),
            }
        );
    }
}
