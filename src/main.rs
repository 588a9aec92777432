use clap::Parser;
use wiki_sync::cli::{run, Cli};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("[ERROR] wiki-sync failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
