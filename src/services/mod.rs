//! External collaborators: search index, byte fetch, image decode, content analysis.
//!
//! The pipelines only see the traits. [`Services::http`] wires the production implementations
//! around one shared blocking HTTP client; tests substitute their own.

pub mod analysis;
pub mod decode;
pub mod fetch;
pub mod search;

pub use analysis::{AnalysisService, VisionClient};
pub use decode::{ImageCrateDecoder, ImageDecoder};
pub use fetch::{ByteFetcher, HttpFetcher};
pub use search::{BingImageSearch, SearchService};

use std::sync::Arc;

use crate::error::ServiceError;
use crate::utils::config::ServiceConfig;

/// The collaborator set consumed by [`ImageStore`](crate::pipeline::ImageStore) and
/// [`DetailPipeline`](crate::pipeline::DetailPipeline).
#[derive(Clone)]
pub struct Services {
    pub search: Arc<dyn SearchService>,
    pub fetcher: Arc<dyn ByteFetcher>,
    pub decoder: Arc<dyn ImageDecoder>,
    pub analysis: Arc<dyn AnalysisService>,
}

impl Services {
    /// Production collaborators built from `config`.
    pub fn http(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = build_client(config)?;
        Ok(Self {
            search: Arc::new(BingImageSearch::new(client.clone(), config)),
            fetcher: Arc::new(HttpFetcher::new(client.clone())),
            decoder: Arc::new(ImageCrateDecoder),
            analysis: Arc::new(VisionClient::new(client, config)),
        })
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// One client for all collaborators so connections are pooled.
pub fn build_client(config: &ServiceConfig) -> Result<reqwest::blocking::Client, ServiceError> {
    // The blocking client has its own 30 s default; pass None through so it really means none.
    let client = reqwest::blocking::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout)
        .build()?;
    Ok(client)
}

/// Map a non-success response to [`ServiceError::Status`], keeping a short body excerpt.
pub(crate) fn check_status(
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body: String = resp.text().unwrap_or_default().chars().take(200).collect();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}
