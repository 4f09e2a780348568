use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_recursion::async_recursion;
use lofty::error::LoftyError;
use lofty::prelude::*;
use lofty::probe::Probe;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::library::MediaItem;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("unable to read directory '{}': {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("error reading tags: {0}")]
    Read(#[from] LoftyError),

    #[error("error probing file: {0}")]
    Io(#[from] io::Error),

    #[error("file has no tags")]
    NoTags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTags {
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Extracts the title and artist from a media file.
pub trait TagReader: Send + Sync + 'static {
    fn read_tags(&self, path: &Path) -> Result<MediaTags, TagError>;
}

/// Reads tags with lofty, preferring the file's primary tag. The format is
/// detected from the file contents, not the extension.
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<MediaTags, TagError> {
        let tagged_file = Probe::open(path)?.guess_file_type()?.read()?;

        let tag = match tagged_file.primary_tag() {
            Some(primary_tag) => primary_tag,
            None => tagged_file.first_tag().ok_or(TagError::NoTags)?,
        };

        Ok(MediaTags {
            title: tag.title().map(|title| title.into_owned()),
            artist: tag.artist().map(|artist| artist.into_owned()),
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub files_scanned: u64,
    pub directories_skipped: u64,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Walks `root` recursively and sends one `MediaItem` per regular file.
///
/// Failing to read `root` itself is fatal. Unreadable subdirectories are
/// logged and skipped. The walk stops early if the receiver is dropped.
pub async fn scan_media<R: TagReader>(
    root: &Path,
    reader: Arc<R>,
    tx: mpsc::Sender<MediaItem>,
) -> Result<ScanSummary, ScanError> {
    info!("Recursively searching '{}'", root.display());

    let mut summary = ScanSummary::default();
    scan_dir(root, &reader, &tx, &mut summary)
        .await
        .map_err(|source| ScanError::ReadDir {
            path: root.to_path_buf(),
            source,
        })?;

    debug!(
        "Scan of '{}' finished: {} files, {} directories skipped",
        root.display(),
        summary.files_scanned,
        summary.directories_skipped
    );
    Ok(summary)
}

#[async_recursion]
async fn scan_dir<R: TagReader>(
    path: &Path,
    reader: &Arc<R>,
    tx: &mpsc::Sender<MediaItem>,
    summary: &mut ScanSummary,
) -> io::Result<()> {
    let mut entries = tokio::fs::read_dir(path).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!("Skipping '{}': {}", path.display(), e);
                continue;
            }
        };

        // Symlinked directories are not followed, symlinked files are.
        if file_type.is_dir() {
            if let Err(e) = scan_dir(&path, reader, tx, summary).await {
                warn!("Skipping directory '{}': {}", path.display(), e);
                summary.directories_skipped += 1;
            }
        } else if file_type.is_file() || is_linked_file(&path, file_type).await {
            summary.files_scanned += 1;
            let item = read_item(reader, path).await;
            if tx.send(item).await.is_err() {
                debug!("Media receiver closed, stopping scan");
                return Ok(());
            }
        }
    }

    Ok(())
}

async fn is_linked_file(path: &Path, file_type: std::fs::FileType) -> bool {
    file_type.is_symlink()
        && tokio::fs::metadata(path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
}

async fn read_item<R: TagReader>(reader: &Arc<R>, path: PathBuf) -> MediaItem {
    let reader = Arc::clone(reader);
    let tag_path = path.clone();
    let tags = tokio::task::spawn_blocking(move || reader.read_tags(&tag_path)).await;

    let tags = match tags {
        Ok(Ok(tags)) => tags,
        Ok(Err(e)) => {
            // Only care about supported files
            if lofty::file::FileType::from_path(&path).is_some() {
                warn!("Error reading tags from '{}': {}", path.display(), e);
            } else {
                debug!("Not a media file '{}': {}", path.display(), e);
            }
            MediaTags::default()
        }
        Err(e) => {
            warn!("Tag reader failed on '{}': {}", path.display(), e);
            MediaTags::default()
        }
    };

    MediaItem {
        path,
        title: non_empty(tags.title),
        artist: non_empty(tags.artist),
    }
}
