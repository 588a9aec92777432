//! Confluence REST implementation of the [`PageDirectory`] contract.
//!
//! Talks to the content API (`/rest/api/content`) with basic auth. The space
//! key, host and credentials are fixed at construction time from the loaded
//! [`PublishConfig`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::PublishConfig;
use crate::directory::{DirectoryError, NewPage, Page, PageDirectory, PageUpdate};

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RemotePage>,
}

#[derive(Deserialize)]
struct RemotePage {
    id: String,
    title: String,
    #[serde(default)]
    version: Option<RemoteVersion>,
    #[serde(default)]
    ancestors: Vec<RemoteAncestor>,
}

#[derive(Deserialize)]
struct RemoteVersion {
    number: i64,
}

#[derive(Deserialize)]
struct RemoteAncestor {
    id: String,
}

impl From<RemotePage> for Page {
    fn from(remote: RemotePage) -> Self {
        Page {
            id: remote.id,
            title: remote.title,
            version: remote.version.map(|v| v.number),
            ancestors: remote.ancestors.into_iter().map(|a| a.id).collect(),
        }
    }
}

/// Client for a single Confluence space.
pub struct ConfluenceDirectory {
    client: Client,
    base_url: String,
    space_key: String,
    username: String,
    api_token: String,
}

impl ConfluenceDirectory {
    pub fn new(config: &PublishConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(), // avoid "//"
            space_key: config.space_key.clone(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
        }
    }

    fn content_url(&self) -> String {
        format!("{}/rest/api/content", self.base_url)
    }

    /// Turns a non-2xx response into a DirectoryError carrying status and
    /// response body, so operators see what the API actually said.
    async fn check(url: &str, resp: reqwest::Response) -> Result<reqwest::Response, DirectoryError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        Err(format!("Confluence API error: url: {url}, status: {status}, response_body: {text}").into())
    }
}

#[async_trait]
impl PageDirectory for ConfluenceDirectory {
    async fn find_by_title(&self, title: &str) -> Result<Vec<Page>, DirectoryError> {
        let url = self.content_url();
        debug!(url = %url, title = title, "Looking up page by title");
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("spaceKey", self.space_key.as_str()),
                ("title", title),
                ("expand", "version,ancestors"),
            ])
            .basic_auth(&self.username, Some(&self.api_token))
            .send()
            .await?;
        let resp = Self::check(&url, resp).await?;
        let body: SearchResponse = resp.json().await?;
        Ok(body.results.into_iter().map(Page::from).collect())
    }

    async fn create_page<'a>(&self, req: NewPage<'a>) -> Result<Page, DirectoryError> {
        let url = self.content_url();
        debug!(url = %url, title = req.title, "Creating page");
        let mut payload = json!({
            "type": "page",
            "title": req.title,
            "space": { "key": self.space_key },
            "body": {
                "storage": {
                    "value": req.body,
                    "representation": req.representation.as_str(),
                }
            },
        });
        if !req.ancestors.is_empty() {
            payload["ancestors"] = json!(req
                .ancestors
                .iter()
                .map(|id| json!({ "id": id }))
                .collect::<Vec<_>>());
        }

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.api_token))
            .json(&payload)
            .send()
            .await?;
        let resp = Self::check(&url, resp).await?;
        let page: RemotePage = resp.json().await?;
        Ok(page.into())
    }

    async fn update_page<'a>(&self, req: PageUpdate<'a>) -> Result<Page, DirectoryError> {
        let url = format!("{}/{}", self.content_url(), req.id);
        debug!(url = %url, title = req.title, version = req.version, "Updating page");
        let payload = json!({
            "id": req.id,
            "type": "page",
            "title": req.title,
            "body": {
                "storage": {
                    "value": req.body,
                    "representation": req.representation.as_str(),
                }
            },
            "version": { "number": req.version },
            "ancestors": req
                .ancestors
                .iter()
                .map(|id| json!({ "id": id }))
                .collect::<Vec<_>>(),
        });

        let resp = self
            .client
            .put(&url)
            .basic_auth(&self.username, Some(&self.api_token))
            .json(&payload)
            .send()
            .await?;
        let resp = Self::check(&url, resp).await?;
        let page: RemotePage = resp.json().await?;
        Ok(page.into())
    }
}
