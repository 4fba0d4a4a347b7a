use anyhow::Result;
use crossbeam_channel::select;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::RunError;
use crate::pipeline;
use crate::pipeline::thumbnail::{ThumbnailOutcome, ThumbnailStage};
use crate::services::Services;
use crate::types::{Entry, RunOpts};
use crate::utils::config::MIN_PAGE_SIZE;
use crate::utils::locks::lock;
use crate::utils::logger::Logger;
use crate::{ProgressTracker, ResultCollection, RunScope};

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every dispatched item settled. `added + failed` equals the number of search hits.
    Completed { added: usize, failed: usize },
    /// The search call itself failed; no entries were added.
    SearchFailed,
    /// The scope was disposed (cancel or a newer run) before completion.
    Cancelled,
}

/// Handle to a started run. Dropping it detaches the run.
pub struct RunHandle {
    scope: Arc<RunScope>,
    handle: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub fn id(&self) -> u64 {
        self.scope.id()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run's dispatcher to exit. Returns promptly after the run is cancelled even
    /// if network calls are still in flight.
    pub fn wait(self) -> Result<RunOutcome> {
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("run {} dispatcher panicked", self.scope.id()))
    }
}

/// Validate run arguments before any I/O: non-blank query, page ≥ 1, page size ≥ 10.
pub fn validate_run_args(query: &str, page: u32, page_size: u32) -> Result<(), RunError> {
    if query.trim().is_empty() {
        return Err(RunError::InvalidArgument {
            name: "query",
            reason: "must not be blank".into(),
        });
    }
    if page < 1 {
        return Err(RunError::InvalidArgument {
            name: "page",
            reason: "must be 1 or over".into(),
        });
    }
    if page_size < MIN_PAGE_SIZE {
        return Err(RunError::InvalidArgument {
            name: "page_size",
            reason: format!("must be {MIN_PAGE_SIZE} or over"),
        });
    }
    Ok(())
}

/// Percent of the requested page that has completed, clamped to 100.
pub fn percent_complete(completed: usize, requested: u32) -> f64 {
    if requested == 0 {
        return 100.0;
    }
    (completed as f64 / requested as f64 * 100.0).min(100.0)
}

/// Owns the result collection and drives search runs into it.
///
/// One run at a time: starting a run disposes the previous run's scope before anything else
/// happens. All collection mutations and progress reports of a run happen on that run's
/// dispatcher thread, behind its [`RunScope`].
pub struct ImageStore {
    services: Services,
    logger: Arc<dyn Logger>,
    opts: RunOpts,
    progress: ProgressTracker,
    images: ResultCollection,
    current: Mutex<Option<Arc<RunScope>>>,
    next_run_id: AtomicU64,
}

impl ImageStore {
    pub fn new(services: Services, logger: Arc<dyn Logger>, opts: RunOpts) -> Self {
        Self {
            services,
            logger,
            opts,
            progress: ProgressTracker::new(),
            images: ResultCollection::new(),
            current: Mutex::new(None),
            next_run_id: AtomicU64::new(1),
        }
    }

    pub fn images(&self) -> &ResultCollection {
        &self.images
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Search `query` and stream page `page` (1-based) of `page_size` results into
    /// [`images`](Self::images). Returns as soon as the run is dispatched.
    pub fn run(&self, query: &str, page: u32, page_size: u32) -> Result<RunHandle, RunError> {
        validate_run_args(query, page, page_size)?;

        let mut current = lock(&self.current);
        if let Some(prev) = current.take()
            && prev.dispose()
        {
            debug!("run {} superseded", prev.id());
        }
        self.images.clear();

        let id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let scope = RunScope::open(id, &self.progress);
        self.progress.report_percent(0.0);
        self.logger.info(&format!("Searching \"{}\"...", query));
        *current = Some(Arc::clone(&scope));
        drop(current);

        let ctx = Arc::new(pipeline::PipelineContext {
            scope: Arc::clone(&scope),
            stage: ThumbnailStage {
                fetcher: Arc::clone(&self.services.fetcher),
                decoder: Arc::clone(&self.services.decoder),
            },
            logger: Arc::clone(&self.logger),
        });
        let request = RunRequest {
            query: query.to_string(),
            skip: (page - 1).saturating_mul(page_size),
            top: page_size,
            max_concurrency: self.opts.max_concurrency,
        };
        let search = Arc::clone(&self.services.search);
        let images = self.images.clone();
        let progress = self.progress.clone();
        let handle = thread::spawn(move || run_search(ctx, search, images, progress, request));

        Ok(RunHandle { scope, handle })
    }

    /// Dispose the active run's scope. Completions still in flight are discarded.
    pub fn cancel(&self) {
        if let Some(scope) = lock(&self.current).take()
            && scope.dispose()
        {
            debug!("run {} cancelled", scope.id());
        }
        self.logger.info("Search cancelled");
    }

    /// Empty the collection without touching the active run.
    pub fn clear(&self) {
        self.images.clear();
    }
}

impl Drop for ImageStore {
    fn drop(&mut self) {
        if let Some(scope) = lock(&self.current).take() {
            scope.dispose();
        }
        self.images.clear();
    }
}

impl std::fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageStore")
            .field("images", &self.images)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

struct RunRequest {
    query: String,
    skip: u32,
    top: u32,
    max_concurrency: Option<usize>,
}

/// Dispatcher + single consumer for one run: search, fan out to workers, apply completions.
fn run_search(
    ctx: Arc<pipeline::PipelineContext>,
    search: Arc<dyn crate::services::SearchService>,
    images: ResultCollection,
    progress: ProgressTracker,
    req: RunRequest,
) -> RunOutcome {
    let scope = &ctx.scope;
    let items = match search.query(&req.query, req.skip, req.top) {
        Ok(items) => items,
        Err(e) => {
            let failed = scope.complete(|| {
                pipeline::report_run_failure(ctx.logger.as_ref(), &req.query, &e);
                progress.report_percent(100.0);
            });
            return match failed {
                Some(()) => RunOutcome::SearchFailed,
                None => RunOutcome::Cancelled,
            };
        }
    };
    if !scope.is_live() {
        return RunOutcome::Cancelled;
    }

    let total = items.len();
    let channels = pipeline::create_pipeline_channels(total);
    for (index, item) in items.into_iter().enumerate() {
        // Capacity covers the whole page.
        let _ = channels.item_tx.send((index, item));
    }
    drop(channels.item_tx);

    let num_workers = pipeline::worker_count(total, req.max_concurrency);
    let worker_handles = pipeline::spawn_thumbnail_workers(
        channels.item_rx,
        &channels.done_tx,
        &ctx.stage,
        scope,
        num_workers,
    );
    // Dropping the last sender closes the channel once every worker exits.
    drop(channels.done_tx);

    let closed = scope.closed().clone();
    let mut added = 0_usize;
    let mut failed = 0_usize;
    loop {
        select! {
            recv(channels.done_rx) -> msg => match msg {
                Ok(outcome) => {
                    let applied = scope.apply(|| match outcome {
                        ThumbnailOutcome::Ready { item, thumbnail } => {
                            images.push(Entry::new(item, thumbnail));
                            added += 1;
                            progress.report_percent(percent_complete(added, req.top));
                        }
                        ThumbnailOutcome::Failed { index, item, failure } => {
                            pipeline::report_item_failure(
                                ctx.logger.as_ref(),
                                index,
                                &item,
                                &failure,
                            );
                            failed += 1;
                        }
                    });
                    if applied.is_none() {
                        break;
                    }
                }
                Err(_) => break,
            },
            recv(closed) -> _ => break,
        }
    }

    let completed = scope.complete(|| {
        progress.report_percent(100.0);
        ctx.logger.info(&format!(
            "Search completed: {} of {} images loaded",
            added, total
        ));
    });
    if completed.is_none() {
        // Workers still blocked on I/O are abandoned; they exit on their next send.
        debug!("run {} discarded after {} entries", scope.id(), added);
        return RunOutcome::Cancelled;
    }
    for h in worker_handles {
        let _ = h.join();
    }
    RunOutcome::Completed { added, failed }
}
