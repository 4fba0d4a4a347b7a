//! Pipeline components: run scope and channels, thumbnail workers, result collection,
//! run orchestration, detail enrichment, failure reporting.

pub mod collection;
pub mod context;
pub mod detail;
pub mod error_handler;
pub mod orchestrator;
pub mod thumbnail;

pub use collection::{CollectionEvent, ResultCollection};
pub use context::{
    PipelineChannels, PipelineContext, RunScope, create_pipeline_channels, worker_count,
};
pub use detail::{BranchOutcome, DetailOutcome, DetailPipeline};
pub use error_handler::{report_detail_failure, report_item_failure, report_run_failure};
pub use orchestrator::{
    ImageStore, RunHandle, RunOutcome, percent_complete, validate_run_args,
};
pub use thumbnail::{ThumbnailOutcome, ThumbnailStage, spawn_thumbnail_workers};
