#![doc = "wiki-sync: publish a local documentation folder to a Confluence space."]

//! The crate converges a remote wiki space with a local set of markdown
//! documents: one container page per project, one child page per document,
//! created when absent and updated (with a version bump) when present.
//!
//! The synchronisation algorithm lives in [`synchronise`]; the remote side
//! is abstracted behind [`directory::PageDirectory`] so the same logic runs
//! against the real Confluence API or a test double.

pub mod cli;
pub mod config;
pub mod confluence;
pub mod directory;
pub mod load_config;
pub mod source;
pub mod synchronise;
