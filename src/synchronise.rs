//! High-level pipeline: converge a remote page set with a local document set.
//!
//! This module implements the synchronisation algorithm:
//!   - Ensure a container page exists for the project (create on first run,
//!     reuse on every run after that)
//!   - For each document, create its page when absent or update it (with a
//!     version bump) when present, always parented under the container
//!   - Aggregate per-document outcomes into a [`PublishReport`]
//!
//! # Contracts
//! - A container failure aborts the run: without its id no document page can
//!   be parented correctly.
//! - A per-document failure is isolated: it is logged, recorded as `Failed`
//!   and the remaining documents are still processed.
//! - Updates are unconditional. Even byte-identical content is written again
//!   and bumps the version by one, so two runs of an unchanged set are
//!   observable only as a +1 on each page version.
//!
//! # Callable From
//! - Used by the CLI and by integration tests, against any
//!   [`PageDirectory`] implementation (real client or mock).

use tracing::{error, info, warn};

use crate::directory::{BodyRepresentation, DirectoryError, NewPage, PageDirectory, PageUpdate};
use crate::source::Document;

/// Outcome for a single document title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Published,
    Failed(String),
}

/// Per-document entry in the run report, in processing order.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub title: String,
    pub outcome: DocumentOutcome,
}

/// Result of a publish run: one outcome per document title.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub documents: Vec<DocumentReport>,
}

impl PublishReport {
    pub fn outcome(&self, title: &str) -> Option<&DocumentOutcome> {
        self.documents
            .iter()
            .find(|d| d.title == title)
            .map(|d| &d.outcome)
    }

    pub fn published_count(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| d.outcome == DocumentOutcome::Published)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.documents.len() - self.published_count()
    }
}

/// Fatal synchronisation errors. Per-document failures never surface here;
/// they live in the [`PublishReport`].
#[derive(Debug)]
pub enum SynchroniseError {
    /// The project container could not be found or created.
    Container {
        project: String,
        source: DirectoryError,
    },
}

impl std::fmt::Display for SynchroniseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynchroniseError::Container { project, source } => {
                write!(
                    f,
                    "Failed to create or find project container {project}: {source}"
                )
            }
        }
    }
}

impl std::error::Error for SynchroniseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynchroniseError::Container { source, .. } => Some(source.as_ref()),
        }
    }
}

/// Ensure the project container page exists and return its id.
///
/// The container is looked up by title; when absent it is created with a
/// minimal heading body and no parent. Its content is fixed at creation
/// time and never updated afterwards.
pub async fn ensure_container<D>(
    directory: &D,
    project_name: &str,
) -> Result<String, SynchroniseError>
where
    D: PageDirectory + ?Sized,
{
    let matches = directory
        .find_by_title(project_name)
        .await
        .map_err(|source| SynchroniseError::Container {
            project: project_name.to_string(),
            source,
        })?;

    if let Some(page) = matches.first() {
        if matches.len() > 1 {
            // The space should be title-unique; taking the first match is
            // the documented tie-break.
            warn!(
                title = project_name,
                matches = matches.len(),
                "Multiple pages matched container title, using first"
            );
        }
        info!(
            page_id = %page.id,
            title = project_name,
            "[PUBLISH] Reusing existing project container"
        );
        return Ok(page.id.clone());
    }

    let body = format!("<h1>{project_name}</h1>");
    let created = directory
        .create_page(NewPage {
            title: project_name,
            body: &body,
            representation: BodyRepresentation::Storage,
            ancestors: &[],
        })
        .await
        .map_err(|source| SynchroniseError::Container {
            project: project_name.to_string(),
            source,
        })?;

    info!(
        page_id = %created.id,
        title = project_name,
        "[PUBLISH] Created project container"
    );
    Ok(created.id)
}

/// Publish every document as a child of the container, one at a time.
///
/// Documents are taken exactly as given: no extension or content filtering
/// happens here, that is the document source's concern. A failure on one
/// title is recorded and the remaining documents are still processed.
pub async fn publish_all<D>(
    directory: &D,
    documents: &[Document],
    container_id: &str,
) -> PublishReport
where
    D: PageDirectory + ?Sized,
{
    let mut report = PublishReport::default();

    for document in documents {
        match publish_document(directory, document, container_id).await {
            Ok(()) => {
                info!(title = %document.title, "[PUBLISH] Published document");
                report.documents.push(DocumentReport {
                    title: document.title.clone(),
                    outcome: DocumentOutcome::Published,
                });
            }
            Err(e) => {
                error!(title = %document.title, error = %e, "[PUBLISH][ERROR] Failed to publish document");
                report.documents.push(DocumentReport {
                    title: document.title.clone(),
                    outcome: DocumentOutcome::Failed(e.to_string()),
                });
            }
        }
    }

    report
}

async fn publish_document<D>(
    directory: &D,
    document: &Document,
    container_id: &str,
) -> Result<(), DirectoryError>
where
    D: PageDirectory + ?Sized,
{
    let ancestors = [container_id.to_string()];
    let matches = directory.find_by_title(&document.title).await?;

    match matches.first() {
        Some(existing) => {
            if matches.len() > 1 {
                warn!(
                    title = %document.title,
                    matches = matches.len(),
                    "Multiple pages matched document title, updating first"
                );
            }
            // Missing remote version counts as 0, so the update writes 1.
            let next_version = existing.version.unwrap_or(0) + 1;
            directory
                .update_page(PageUpdate {
                    id: &existing.id,
                    title: &document.title,
                    body: &document.content,
                    representation: BodyRepresentation::Wiki,
                    version: next_version,
                    ancestors: &ancestors,
                })
                .await?;
        }
        None => {
            directory
                .create_page(NewPage {
                    title: &document.title,
                    body: &document.content,
                    representation: BodyRepresentation::Wiki,
                    ancestors: &ancestors,
                })
                .await?;
        }
    }

    Ok(())
}

/// Entrypoint: ensure the container, then publish each document.
///
/// Returns `Ok` with the per-document report whenever the container step
/// succeeded, regardless of individual outcomes; `Err` only when the
/// container could not be found or created.
pub async fn synchronise<D>(
    directory: &D,
    project_name: &str,
    documents: &[Document],
) -> Result<PublishReport, SynchroniseError>
where
    D: PageDirectory + ?Sized,
{
    info!(
        project = project_name,
        documents = documents.len(),
        "[PUBLISH] Starting publish run"
    );

    let container_id = ensure_container(directory, project_name).await?;
    let report = publish_all(directory, documents, &container_id).await;

    info!(
        published = report.published_count(),
        failed = report.failed_count(),
        "[PUBLISH] Publish run complete"
    );
    Ok(report)
}
