//! Websift: streaming image search with parallel thumbnail loading, per-item failure isolation,
//! and on-demand detail (full image, content analysis, face overlay).

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod services;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::overlay::{FaceMarker, Overlay};
pub use engine::progress::{ProgressState, ProgressTracker, ScopeGuard};
pub use error::{FetchStage, ItemFailure, RunError, ServiceError};
pub use pipeline::{
    BranchOutcome, CollectionEvent, DetailOutcome, DetailPipeline, ImageStore, ResultCollection,
    RunHandle, RunOutcome, RunScope,
};
pub use services::Services;
pub use utils::config::ServiceConfig;
pub use utils::logger::{FacadeLogger, LogLevel, LogMessage, Logger, MemoryLogger, NullLogger};

use log::debug;
use std::sync::Arc;

/// Result alias used by public websift API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: run one search page to completion and return its entries in completion
/// order along with how the run ended.
///
/// For streaming (entries as they land, cancellation, superseding runs) keep an [`ImageStore`]
/// and subscribe to [`ImageStore::images`] instead.
///
/// ```ignore
/// let services = websift::Services::http(&config)?;
/// let (entries, outcome) = websift::search_images(services, Arc::new(NullLogger), "otters", 1, 50, &Default::default())?;
/// ```
pub fn search_images(
    services: Services,
    logger: Arc<dyn Logger>,
    query: &str,
    page: u32,
    page_size: u32,
    opts: &RunOpts,
) -> Result<(Vec<Arc<Entry>>, RunOutcome)> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    let store = ImageStore::new(services, logger, opts.clone());
    let outcome = store.run(query, page, page_size)?.wait()?;
    Ok((store.images().snapshot(), outcome))
}
