use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::library::matched_tracks;
use crate::matcher::Matcher;
use crate::scanner::LoftyTagReader;
use crate::uploader::Uploader;

mod catalog;
mod config;
mod library;
mod logger;
mod matcher;
mod query;
mod scanner;
mod uploader;

/// Match local audio files against the catalog and add the matches to your library.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Catalog API access token
    token: String,

    /// Directory to search recursively for audio files
    directory: PathBuf,

    /// Add matched songs without asking
    #[arg(short, long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    dotenv().ok();
    let config = Config::from_env();

    let progress = match logger::init(config.log_level) {
        Ok(progress) => progress,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let catalog = match CatalogClient::new(args.token, &config.catalog_config()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create catalog client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let matcher = Matcher::new(Arc::clone(&catalog), Arc::new(LoftyTagReader), config.match_config())
        .with_progress(progress);

    let lookups = tokio::select! {
        result = matcher.look_up_all(&args.directory) => match result {
            Ok(lookups) => lookups,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling outstanding lookups");
            return ExitCode::FAILURE;
        }
    };

    println!("\nResults:");
    let songs = matched_tracks(&lookups);
    for song in &songs {
        println!("'{}', {}, {}", song.name, song.id, song.uri);
    }

    println!("\nDone: Matched {}/{} songs\n", songs.len(), lookups.len());

    if songs.is_empty() {
        return ExitCode::SUCCESS;
    }

    if !args.yes {
        match confirm("Add songs to library? (y/n)").await {
            Ok(true) => {}
            Ok(false) => return ExitCode::SUCCESS,
            Err(e) => {
                error!("Failed to read answer: {}", e);
                return ExitCode::SUCCESS;
            }
        }
    }

    info!("Adding to library...");
    Uploader::new(catalog, config.upload_config())
        .add_all_to_library(&songs)
        .await;

    ExitCode::SUCCESS
}

async fn confirm(prompt: &str) -> io::Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{}\n", prompt).as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;

    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
