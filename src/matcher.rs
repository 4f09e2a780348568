use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info};
use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};

use crate::catalog::Catalog;
use crate::library::{Lookup, LookupOutcome, MediaItem};
use crate::query::{normalize, Query};
use crate::scanner::{scan_media, ScanError, TagReader};

const MEDIA_CHANNEL_SIZE: usize = 100;

pub struct MatchConfig {
    /// Added to each successive search's start delay.
    pub search_stagger: Duration,
    pub show_progress: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            search_stagger: Duration::from_millis(100),
            show_progress: true,
        }
    }
}

/// Matches every titled file under a directory against the catalog.
pub struct Matcher<C, R> {
    catalog: Arc<C>,
    reader: Arc<R>,
    config: MatchConfig,
    progress: Option<MultiProgress>,
}

impl<C: Catalog + 'static, R: TagReader> Matcher<C, R> {
    pub fn new(catalog: Arc<C>, reader: Arc<R>, config: MatchConfig) -> Self {
        Self {
            catalog,
            reader,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Looks up all files under `root`, returning once every scheduled search
    /// has finished. One `Lookup` per file with a title, in completion order.
    ///
    /// Searches run concurrently, the k-th one starting `k * search_stagger`
    /// after it is scheduled. Dropping the returned future aborts any search
    /// still outstanding.
    pub async fn look_up_all(&self, root: &Path) -> Result<Vec<Lookup>, ScanError> {
        let (tx, mut items) = mpsc::channel(MEDIA_CHANNEL_SIZE);
        let scan = scan_media(root, Arc::clone(&self.reader), tx);
        tokio::pin!(scan);

        let progress = self.progress_bar();
        let mut lookups = JoinSet::new();
        let mut pending = HashMap::new();
        let mut results = Vec::new();
        let mut scan_summary = None;
        let mut walking = true;
        let mut scheduled: u32 = 0;
        let mut skipped: u64 = 0;

        loop {
            tokio::select! {
                summary = &mut scan, if scan_summary.is_none() => {
                    scan_summary = Some(summary?);
                }
                item = items.recv(), if walking => match item {
                    Some(item) => match query_for(&item) {
                        Some(query) => {
                            let delay = self.config.search_stagger * scheduled;
                            scheduled += 1;
                            progress.inc_length(1);
                            let id = self.spawn_lookup(&mut lookups, query.clone(), delay);
                            pending.insert(id, (item.path, query));
                        }
                        None => skipped += 1,
                    },
                    None => walking = false,
                },
                Some(joined) = lookups.join_next_with_id() => {
                    progress.inc(1);
                    let (id, outcome) = match joined {
                        Ok((id, outcome)) => (id, outcome),
                        Err(e) => {
                            error!("Lookup task failed: {}", e);
                            (e.id(), LookupOutcome::Unmatched)
                        }
                    };
                    let Some((source, query)) = pending.remove(&id) else {
                        error!("Finished lookup {} was never scheduled", id);
                        continue;
                    };

                    match &outcome {
                        LookupOutcome::Matched(track) => info!("Matched '{}'", track.name),
                        LookupOutcome::Unmatched => info!("Failed to match '{}'", query),
                    }
                    results.push(Lookup { source, query, outcome });
                }
                else => break,
            }
        }

        progress.finish_and_clear();

        let files_scanned = scan_summary.map(|s| s.files_scanned).unwrap_or_default();
        info!(
            "Looked up {} of {} files ({} skipped without a title)",
            scheduled, files_scanned, skipped
        );

        Ok(results)
    }

    fn spawn_lookup(
        &self,
        lookups: &mut JoinSet<LookupOutcome>,
        query: Query,
        delay: Duration,
    ) -> task::Id {
        info!("Looking up '{}'...", query);

        let catalog = Arc::clone(&self.catalog);
        lookups
            .spawn(async move {
                tokio::time::sleep(delay).await;
                LookupOutcome::from_tracks(catalog.search(&query).await)
            })
            .id()
    }

    fn progress_bar(&self) -> ProgressBar {
        match &self.progress {
            Some(multi) if self.config.show_progress => {
                let bar = multi.add(ProgressBar::new(0));
                let style = ProgressStyle::with_template(
                    "[{percent}%] {pos}/{len} {wide_bar} ({eta} @ {per_sec})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar());
                bar.set_style(style);
                bar
            }
            _ => ProgressBar::hidden(),
        }
    }
}

fn query_for(item: &MediaItem) -> Option<Query> {
    match item.title.as_deref() {
        Some(title) => Some(normalize(title, item.artist.as_deref())),
        None => {
            info!("Skipping '{}' (no title)", item.file_name());
            None
        }
    }
}
