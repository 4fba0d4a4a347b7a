//! Thumbnail stage: fetch + decode one result's thumbnail, and the worker pool that runs it.

use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{FetchStage, ItemFailure};
use crate::services::{ByteFetcher, ImageDecoder};
use crate::types::{DecodedImage, SearchResultItem};

use super::context::RunScope;

/// Fetch + decode collaborators for thumbnails.
#[derive(Clone)]
pub struct ThumbnailStage {
    pub fetcher: Arc<dyn ByteFetcher>,
    pub decoder: Arc<dyn ImageDecoder>,
}

/// What a worker reports for one item.
pub enum ThumbnailOutcome {
    Ready {
        item: SearchResultItem,
        thumbnail: DecodedImage,
    },
    Failed {
        index: usize,
        item: SearchResultItem,
        failure: ItemFailure,
    },
}

impl ThumbnailStage {
    /// Download and decode `item`'s thumbnail. A decode failure is reported like a fetch failure.
    pub fn fetch_thumbnail(&self, item: &SearchResultItem) -> Result<DecodedImage, ItemFailure> {
        let bytes = self
            .fetcher
            .fetch(&item.thumbnail_url)
            .map_err(|e| ItemFailure::new(FetchStage::Thumbnail, e))?;
        self.decoder
            .decode(&bytes)
            .map_err(|e| ItemFailure::new(FetchStage::Decode, e))
    }

    fn process(&self, index: usize, item: SearchResultItem) -> ThumbnailOutcome {
        match self.fetch_thumbnail(&item) {
            Ok(thumbnail) => ThumbnailOutcome::Ready {
                item,
                thumbnail,
            },
            Err(failure) => ThumbnailOutcome::Failed {
                index,
                item,
                failure,
            },
        }
    }
}

/// Single thumbnail worker: read items from item_rx, fetch + decode, report on done_tx.
/// Stops picking up new items once the scope is closed.
fn thumbnail_worker_loop(
    item_rx: Receiver<(usize, SearchResultItem)>,
    done_tx: Sender<ThumbnailOutcome>,
    stage: ThumbnailStage,
    scope: Arc<RunScope>,
) {
    while let Ok((index, item)) = item_rx.recv() {
        if !scope.is_live() {
            break;
        }
        if done_tx.send(stage.process(index, item)).is_err() {
            break;
        }
    }
}

/// Spawn thumbnail workers. Caller must drop its `done_tx` after this so the consumer sees the
/// channel close once every worker is done.
pub fn spawn_thumbnail_workers(
    item_rx: Receiver<(usize, SearchResultItem)>,
    done_tx: &Sender<ThumbnailOutcome>,
    stage: &ThumbnailStage,
    scope: &Arc<RunScope>,
    num_workers: usize,
) -> Vec<JoinHandle<()>> {
    debug!("run {}: spawning {} thumbnail workers", scope.id(), num_workers);
    (0..num_workers)
        .map(|_| {
            let item_rx = item_rx.clone();
            let done_tx = done_tx.clone();
            let stage = stage.clone();
            let scope = Arc::clone(scope);
            thread::spawn(move || thumbnail_worker_loop(item_rx, done_tx, stage, scope))
        })
        .collect()
}
