use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::confluence::ConfluenceDirectory;
use crate::load_config::load_config;
use crate::source::list_documents;
use crate::synchronise::synchronise;

/// CLI for wiki-sync: publish local documentation to a Confluence space.
#[derive(Parser)]
#[clap(
    name = "wiki-sync",
    version,
    about = "Publish a folder of markdown documents to a Confluence space"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish all documents in the configured folder to the wiki space
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Publish { config } => {
            let config = load_config(config)?;
            config.trace_loaded();

            let documents = list_documents(&config.docs_dir)?;
            let directory = ConfluenceDirectory::new(&config);

            println!("Publish starting...");
            match synchronise(&directory, &config.project_name, &documents).await {
                Ok(report) => {
                    // Per-document failures are already logged and reported;
                    // they do not affect the exit status.
                    println!("Publish complete.\nReport:");
                    println!("{:#?}", report);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Publish aborted: {}", e);
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
