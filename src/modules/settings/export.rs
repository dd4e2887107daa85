//! Deprecated: renders the settings record as a JS config module.

use std::path::Path;

use anyhow::Context;

use super::model::Settings;

/// Attributes never written to the exported file.
pub const IGNORED_ATTRIBUTES: &[&str] = &[
    "email",
    "created_at",
    "updated_at",
    "id",
    "ec2_instance_count",
];

const HEADER: &str = "/**\n * Amazon AWS API Configuration\n *\n * Main Amazon settings used by the render console.\n * Generated from the settings record.\n *\n */\n\n";

pub fn render_config_file(settings: &Settings) -> String {
    let mut out = String::from(HEADER);
    out.push_str("module.exports.aws = {\n\n\tsettings: {\n");

    for (name, value) in settings.attributes() {
        if IGNORED_ATTRIBUTES.contains(&name) {
            continue;
        }
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        out.push_str(&format!("\t\t{name}: \"{escaped}\",\n"));
    }

    out.push_str("\n\t}\n}");
    out
}

pub async fn export_config_file(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    tokio::fs::write(path, render_config_file(settings))
        .await
        .with_context(|| format!("Failed to write config file {}", path.display()))?;

    Ok(())
}
