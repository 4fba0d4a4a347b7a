//! Detail pipeline: full-resolution image + content analysis for a selected entry, then the
//! face overlay.

use log::debug;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::engine::overlay::render_overlay;
use crate::engine::progress::ProgressTracker;
use crate::error::{FetchStage, ItemFailure, ServiceError};
use crate::services::{AnalysisService, ByteFetcher, ImageDecoder, Services};
use crate::types::{DisplaySize, Entry};
use crate::utils::locks::lock;
use crate::utils::logger::Logger;

use super::error_handler::report_detail_failure;

/// Result of one detail branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchOutcome {
    /// The field was already populated; no call was made.
    Skipped,
    Loaded,
    Failed,
}

/// Result of [`DetailPipeline::process`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetailOutcome {
    pub full_image: BranchOutcome,
    pub analysis: BranchOutcome,
    /// An overlay was rendered and stored on the entry.
    pub overlay: bool,
}

impl DetailOutcome {
    /// Nothing was fetched because the entry already held both fields.
    pub fn was_noop(&self) -> bool {
        self.full_image == BranchOutcome::Skipped && self.analysis == BranchOutcome::Skipped
    }
}

/// Enriches one selected entry at a time. Independent of any search run's cancellation.
pub struct DetailPipeline {
    fetcher: Arc<dyn ByteFetcher>,
    decoder: Arc<dyn ImageDecoder>,
    analysis: Arc<dyn AnalysisService>,
    logger: Arc<dyn Logger>,
    progress: ProgressTracker,
    display_size: Mutex<DisplaySize>,
}

impl DetailPipeline {
    pub fn new(services: &Services, logger: Arc<dyn Logger>) -> Self {
        Self {
            fetcher: Arc::clone(&services.fetcher),
            decoder: Arc::clone(&services.decoder),
            analysis: Arc::clone(&services.analysis),
            logger,
            progress: ProgressTracker::new(),
            display_size: Mutex::new(DisplaySize::default()),
        }
    }

    /// Busy while either branch of any invocation is running.
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn display_size(&self) -> DisplaySize {
        *lock(&self.display_size)
    }

    pub fn set_display_size(&self, size: DisplaySize) {
        *lock(&self.display_size) = size;
    }

    /// Store the new display size and redraw `entry`'s overlay for it.
    pub fn resize(&self, entry: &Entry, size: DisplaySize) -> bool {
        self.set_display_size(size);
        self.recompute_overlay(entry)
    }

    /// Fetch the full image and the analysis concurrently, then recompute the overlay once both
    /// settle. Missing fields only; calls on the same entry are serialized.
    pub fn process(&self, entry: &Entry) -> DetailOutcome {
        let _gate = entry.detail_gate();
        let detail = entry.detail();
        if detail.full_image.is_some() && detail.analysis.is_some() {
            debug!("detail already loaded for {}", entry.item().media_url);
            return DetailOutcome {
                full_image: BranchOutcome::Skipped,
                analysis: BranchOutcome::Skipped,
                overlay: false,
            };
        }

        // Covers both branches so observers see one busy period per call.
        let _busy = self.progress.start_scope();
        let (full_image, analysis) = thread::scope(|s| {
            let full = detail
                .full_image
                .is_none()
                .then(|| s.spawn(|| self.load_full_image(entry)));
            let analysis = detail
                .analysis
                .is_none()
                .then(|| s.spawn(|| self.load_analysis(entry)));
            (
                self.join_branch(full, entry, FetchStage::FullImage),
                self.join_branch(analysis, entry, FetchStage::Analysis),
            )
        });

        let overlay = self.recompute_overlay(entry);
        DetailOutcome {
            full_image,
            analysis,
            overlay,
        }
    }

    /// Run [`process`](Self::process) on a background thread.
    pub fn spawn(self: &Arc<Self>, entry: Arc<Entry>) -> JoinHandle<DetailOutcome> {
        let this = Arc::clone(self);
        thread::spawn(move || this.process(&entry))
    }

    /// Redraw the overlay at the current display size. No-op (false) without a full image, an
    /// analysis, usable source dimensions, or a non-degenerate display size.
    pub fn recompute_overlay(&self, entry: &Entry) -> bool {
        let detail = entry.detail();
        let Some(analysis) = detail.analysis.as_ref() else {
            return false;
        };
        if detail.full_image.is_none() {
            return false;
        }
        match render_overlay(entry.item(), analysis, self.display_size()) {
            Some(overlay) => {
                entry.set_overlay(overlay);
                true
            }
            None => false,
        }
    }

    fn load_full_image(&self, entry: &Entry) -> BranchOutcome {
        let _scope = self.progress.start_scope();
        let url = &entry.item().media_url;
        self.logger.info(&format!("Downloading image... [{}]", url));
        let loaded = self
            .fetcher
            .fetch(url)
            .and_then(|bytes| self.decoder.decode(&bytes));
        match loaded {
            Ok(image) => {
                entry.set_full_image(image);
                self.logger.info(&format!("Image downloaded [{}]", url));
                BranchOutcome::Loaded
            }
            Err(e) => {
                let failure = ItemFailure::new(FetchStage::FullImage, e);
                report_detail_failure(self.logger.as_ref(), entry.item(), &failure);
                BranchOutcome::Failed
            }
        }
    }

    fn load_analysis(&self, entry: &Entry) -> BranchOutcome {
        let _scope = self.progress.start_scope();
        let url = &entry.item().media_url;
        self.logger.info(&format!("Analyzing image... [{}]", url));
        match self.analysis.analyze(url) {
            Ok(result) => {
                entry.set_analysis(result);
                self.logger.info(&format!("Image analyzed [{}]", url));
                BranchOutcome::Loaded
            }
            Err(e) => {
                let failure = ItemFailure::new(FetchStage::Analysis, e);
                report_detail_failure(self.logger.as_ref(), entry.item(), &failure);
                BranchOutcome::Failed
            }
        }
    }

    /// Wait for a branch. A panicked branch counts as failed and is logged like one.
    fn join_branch(
        &self,
        handle: Option<thread::ScopedJoinHandle<'_, BranchOutcome>>,
        entry: &Entry,
        stage: FetchStage,
    ) -> BranchOutcome {
        let Some(h) = handle else {
            return BranchOutcome::Skipped;
        };
        h.join().unwrap_or_else(|_| {
            let failure = ItemFailure::new(stage, ServiceError::other(format!("{stage} panicked")));
            report_detail_failure(self.logger.as_ref(), entry.item(), &failure);
            BranchOutcome::Failed
        })
    }
}

impl std::fmt::Debug for DetailPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailPipeline")
            .field("display_size", &self.display_size())
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}
