use crate::config::PublishConfig;
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Deserialize)]
struct StaticConfig {
    confluence: ConfluenceSection,
    docs: DocsSection,
}

#[derive(Deserialize)]
struct ConfluenceSection {
    base_url: String,
    space_key: String,
}

#[derive(Deserialize)]
struct DocsSection {
    dir: std::path::PathBuf,
    #[serde(default)]
    project_name: Option<String>,
}

/// Loads a static YAML config file (no secrets) and injects required env vars
/// for credentials. Returns a fully merged [`PublishConfig`] or an error.
///
/// Every required parameter is validated as present and non-empty here, so a
/// broken configuration fails before the first remote call.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PublishConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let username = match std::env::var("CONFLUENCE_USERNAME") {
        Ok(v) if !v.trim().is_empty() => v,
        Ok(_) => {
            error!("CONFLUENCE_USERNAME is set but empty");
            anyhow::bail!("CONFLUENCE_USERNAME is set but empty");
        }
        Err(e) => {
            error!(error = ?e, "CONFLUENCE_USERNAME environment variable not set");
            return Err(anyhow::anyhow!(
                "CONFLUENCE_USERNAME environment variable not set: {e}"
            ));
        }
    };

    let api_token = match std::env::var("CONFLUENCE_API_TOKEN") {
        Ok(v) if !v.trim().is_empty() => v,
        Ok(_) => {
            error!("CONFLUENCE_API_TOKEN is set but empty");
            anyhow::bail!("CONFLUENCE_API_TOKEN is set but empty");
        }
        Err(e) => {
            error!(error = ?e, "CONFLUENCE_API_TOKEN environment variable not set");
            return Err(anyhow::anyhow!(
                "CONFLUENCE_API_TOKEN environment variable not set: {e}"
            ));
        }
    };

    if static_conf.confluence.base_url.trim().is_empty() {
        error!("confluence.base_url must not be empty");
        anyhow::bail!("confluence.base_url must not be empty");
    }
    if static_conf.confluence.space_key.trim().is_empty() {
        error!("confluence.space_key must not be empty");
        anyhow::bail!("confluence.space_key must not be empty");
    }

    let project_name = match static_conf.docs.project_name {
        Some(name) if !name.trim().is_empty() => name,
        Some(_) => {
            error!("docs.project_name is set but empty");
            anyhow::bail!("docs.project_name is set but empty");
        }
        // Default: the name of the directory enclosing the docs folder.
        None => match static_conf
            .docs
            .dir
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        {
            Some(name) if !name.is_empty() => {
                info!(project_name = %name, "Derived project name from docs dir parent");
                name.to_string()
            }
            _ => {
                error!(docs_dir = %static_conf.docs.dir.display(), "Cannot derive project name from docs dir; set docs.project_name");
                anyhow::bail!(
                    "Cannot derive a project name from docs dir {:?}; set docs.project_name",
                    static_conf.docs.dir
                );
            }
        },
    };

    let config = PublishConfig {
        base_url: static_conf
            .confluence
            .base_url
            .trim_end_matches('/')
            .to_string(),
        space_key: static_conf.confluence.space_key,
        username,
        api_token,
        docs_dir: static_conf.docs.dir,
        project_name,
    };

    info!(
        space_key = %config.space_key,
        docs_dir = %config.docs_dir.display(),
        "Config loaded and merged successfully"
    );

    Ok(config)
}
