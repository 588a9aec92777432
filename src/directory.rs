//! # directory: contract for the remote page directory
//!
//! This module defines a single trait ([`PageDirectory`]) and the supporting
//! data types for looking up, creating and updating pages in a wiki space.
//!
//! ## Interface & Extensibility
//! - Implement [`PageDirectory`] to target a concrete backend (Confluence
//!   REST, an in-memory fake, etc).
//! - All methods are async and return boxed error types; implementors
//!   convert every meaningful upstream failure into a [`DirectoryError`].
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error type for PageDirectory operations (simple boxed error).
pub type DirectoryError = Box<dyn std::error::Error + Send + Sync>;

/// A page as known to the remote directory.
#[derive(Debug, Clone)]
pub struct Page {
    /// Opaque identifier assigned by the remote directory.
    pub id: String,
    pub title: String,
    /// Current version number, when the directory reported one.
    pub version: Option<i64>,
    /// Ids of ancestor pages, nearest parent last. At most one is used here.
    pub ancestors: Vec<String>,
}

/// How the body text should be interpreted by the remote directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRepresentation {
    /// Confluence storage format (XHTML).
    Storage,
    /// Confluence wiki markup.
    Wiki,
}

impl BodyRepresentation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyRepresentation::Storage => "storage",
            BodyRepresentation::Wiki => "wiki",
        }
    }
}

/// The bare minimum data needed to create a page.
pub struct NewPage<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub representation: BodyRepresentation,
    /// Parent page ids; empty for a top-level page.
    pub ancestors: &'a [String],
}

/// Everything required to overwrite an existing page.
///
/// `version` is the number the update sets, i.e. the caller has already
/// computed current + 1.
pub struct PageUpdate<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub representation: BodyRepresentation,
    pub version: i64,
    pub ancestors: &'a [String],
}

/// Trait for looking up and mutating pages in a title-indexed wiki space.
/// The implementor is responsible for the space key, host and credentials.
///
/// The trait is implemented by the real client and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageDirectory: Send + Sync {
    /// Find pages by exact title within the configured space.
    ///
    /// Zero or one match is expected; the directory is treated as a
    /// title-unique index. Callers use the first element when more than one
    /// is ever returned.
    async fn find_by_title(&self, title: &str) -> Result<Vec<Page>, DirectoryError>;

    /// Create a new page, returning it with its assigned id.
    async fn create_page<'a>(&self, req: NewPage<'a>) -> Result<Page, DirectoryError>;

    /// Overwrite an existing page, setting the given version number.
    async fn update_page<'a>(&self, req: PageUpdate<'a>) -> Result<Page, DirectoryError>;
}
