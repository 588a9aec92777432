use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Extension that marks a file as a publishable text document.
const DOCUMENT_EXTENSION: &str = "md";

/// A local document ready for publishing. The title is the file name with
/// its extension stripped and identifies the remote page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub content: String,
}

/// Enumerate the publishable documents in `folder`.
///
/// Only regular files with a markdown extension are included; everything
/// else (subdirectories, other file types) is skipped. Entries are sorted by
/// file name so enumeration order is deterministic across runs. Any failure
/// to read the folder or a matching file is fatal: without a readable source
/// nothing can be published.
pub fn list_documents(folder: &Path) -> Result<Vec<Document>> {
    let entries = fs::read_dir(folder)
        .with_context(|| format!("Failed to read docs folder {:?}", folder))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to enumerate docs folder {:?}", folder))?;
        paths.push(entry.path());
    }
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        if !path.is_file() {
            debug!(path = %path.display(), "Skipping non-file entry");
            continue;
        }
        let is_document = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == DOCUMENT_EXTENSION)
            .unwrap_or(false);
        if !is_document {
            debug!(path = %path.display(), "Skipping non-document file");
            continue;
        }

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Document file name is not valid UTF-8: {:?}", path))?
            .to_string();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read document {:?}", path))?;

        documents.push(Document { title, content });
    }

    info!(
        folder = %folder.display(),
        count = documents.len(),
        "Enumerated publishable documents"
    );
    Ok(documents)
}
