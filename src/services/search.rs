//! Image search collaborator.

use serde::Deserialize;

use super::check_status;
use crate::SearchResultItem;
use crate::error::ServiceError;
use crate::utils::config::{ServiceConfig, ServiceDefaults};

/// Queries the image index for one page of results. A single upstream call per run.
pub trait SearchService: Send + Sync {
    fn query(&self, term: &str, skip: u32, top: u32) -> Result<Vec<SearchResultItem>, ServiceError>;
}

/// Bing image search (v7 REST API).
pub struct BingImageSearch {
    client: reqwest::blocking::Client,
    endpoint: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<ImageHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageHit {
    content_url: Option<String>,
    thumbnail_url: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    host_page_url: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl TryFrom<ImageHit> for SearchResultItem {
    type Error = ServiceError;

    fn try_from(hit: ImageHit) -> Result<Self, Self::Error> {
        Ok(SearchResultItem {
            media_url: hit.content_url.ok_or(ServiceError::MissingField("contentUrl"))?,
            thumbnail_url: hit
                .thumbnail_url
                .ok_or(ServiceError::MissingField("thumbnailUrl"))?,
            title: hit.name,
            source_url: hit.host_page_url,
            width: hit.width,
            height: hit.height,
        })
    }
}

/// Parse a search response body into result items. Hits without image URLs are skipped.
pub fn parse_search_response(body: &str) -> Result<Vec<SearchResultItem>, ServiceError> {
    let resp: SearchResponse = serde_json::from_str(body)?;
    Ok(resp
        .value
        .into_iter()
        .filter_map(|hit| match SearchResultItem::try_from(hit) {
            Ok(item) => Some(item),
            Err(e) => {
                log::debug!("Skipping search hit: {}", e);
                None
            }
        })
        .collect())
}

impl BingImageSearch {
    pub fn new(client: reqwest::blocking::Client, config: &ServiceConfig) -> Self {
        Self {
            client,
            endpoint: config.search_endpoint.clone(),
            key: config.search_key.clone(),
        }
    }
}

impl SearchService for BingImageSearch {
    fn query(&self, term: &str, skip: u32, top: u32) -> Result<Vec<SearchResultItem>, ServiceError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .header(ServiceDefaults::KEY_HEADER, &self.key)
            .query(&[
                ("q", term.to_string()),
                ("offset", skip.to_string()),
                ("count", top.to_string()),
            ])
            .send()?;
        let body = check_status(resp)?.text()?;
        parse_search_response(&body)
    }
}
