//! Raw byte download.

use super::check_status;
use crate::error::ServiceError;

/// Downloads the body at `url`. Failures are isolated to the item being fetched.
pub trait ByteFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ServiceError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl ByteFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        let resp = check_status(self.client.get(url).send()?)?;
        Ok(resp.bytes()?.to_vec())
    }
}
