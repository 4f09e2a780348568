use std::sync::Arc;
use std::time::Duration;

use async_recursion::async_recursion;
use log::{error, info};

use crate::catalog::Catalog;
use crate::library::Track;

/// Most tracks the catalog accepts in one library-add call.
pub const MAX_BATCH_SIZE: usize = 50;

pub struct UploadConfig {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            batch_delay: Duration::from_millis(100),
        }
    }
}

pub struct Uploader<C> {
    catalog: Arc<C>,
    batch_size: usize,
    batch_delay: Duration,
}

impl<C: Catalog + 'static> Uploader<C> {
    pub fn new(catalog: Arc<C>, config: UploadConfig) -> Self {
        Self {
            catalog,
            batch_size: config.batch_size.clamp(1, MAX_BATCH_SIZE),
            batch_delay: config.batch_delay,
        }
    }

    /// Adds the songs to the library one batch at a time, in order.
    ///
    /// Stops at the first batch the catalog rejects; later batches are never
    /// sent.
    #[async_recursion]
    pub async fn add_all_to_library(&self, songs: &[Track]) {
        if songs.is_empty() {
            return;
        }

        let (batch, remaining) = songs.split_at(songs.len().min(self.batch_size));
        info!("Adding batch of {} songs to library...", batch.len());

        if !self.catalog.add_to_library(batch).await {
            error!("Failed to upload batch, {} songs not added", songs.len());
            return;
        }

        if remaining.is_empty() {
            info!("Done adding songs!");
            return;
        }

        info!(
            "Added batch of {} songs to library, {} remaining...",
            batch.len(),
            remaining.len()
        );

        tokio::time::sleep(self.batch_delay).await;
        self.add_all_to_library(remaining).await
    }
}
