use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Fully resolved runtime configuration: connection parameters, space key,
/// credentials and the local docs folder. Built once by
/// [`crate::load_config::load_config`] and passed in explicitly; nothing in
/// the synchronisation logic reads ambient process state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Confluence base URL, e.g. `https://example.atlassian.net/wiki`.
    pub base_url: String,
    pub space_key: String,
    pub username: String,
    /// API token used with `username` for basic auth.
    pub api_token: String,
    /// Folder containing the markdown documents to publish.
    pub docs_dir: PathBuf,
    /// Title of the project container page all document pages hang under.
    pub project_name: String,
}

impl PublishConfig {
    pub fn trace_loaded(&self) {
        info!(
            base_url = %self.base_url,
            space_key = %self.space_key,
            docs_dir = %self.docs_dir.display(),
            project_name = %self.project_name,
            "Loaded PublishConfig"
        );
        // The token never goes to the log, even at debug.
        debug!(
            username = %self.username,
            api_token_len = self.api_token.len(),
            "PublishConfig credentials present"
        );
    }
}
