//! Content-analysis collaborator (faces, adult/racy scores, colours, categories).

use super::check_status;
use crate::AnalysisResult;
use crate::error::ServiceError;
use crate::utils::config::{ServiceConfig, ServiceDefaults};

/// Analyzes the image behind `image_url`. The service fetches the image itself.
pub trait AnalysisService: Send + Sync {
    fn analyze(&self, image_url: &str) -> Result<AnalysisResult, ServiceError>;
}

/// Computer Vision `analyze` REST endpoint.
pub struct VisionClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    key: String,
}

impl VisionClient {
    pub fn new(client: reqwest::blocking::Client, config: &ServiceConfig) -> Self {
        Self {
            client,
            endpoint: config.vision_endpoint.trim_end_matches('/').to_string(),
            key: config.vision_key.clone(),
        }
    }

    fn analyze_url(&self) -> String {
        format!("{}/vision/v3.2/analyze", self.endpoint)
    }
}

impl AnalysisService for VisionClient {
    fn analyze(&self, image_url: &str) -> Result<AnalysisResult, ServiceError> {
        if self.key.is_empty() {
            return Err(ServiceError::other("no analysis subscription key configured"));
        }
        let resp = self
            .client
            .post(self.analyze_url())
            .header(ServiceDefaults::KEY_HEADER, &self.key)
            .query(&[("visualFeatures", ServiceDefaults::VISUAL_FEATURES)])
            .json(&serde_json::json!({ "url": image_url }))
            .send()?;
        let body = check_status(resp)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_url_strips_trailing_slash() {
        let config = ServiceConfig {
            vision_endpoint: "https://example.test/".into(),
            ..Default::default()
        };
        let client = VisionClient::new(reqwest::blocking::Client::new(), &config);
        assert_eq!(
            client.analyze_url(),
            "https://example.test/vision/v3.2/analyze"
        );
    }

    #[test]
    fn test_missing_key_fails_without_request() {
        let client =
            VisionClient::new(reqwest::blocking::Client::new(), &ServiceConfig::default());
        assert!(matches!(
            client.analyze("http://img/1.jpg"),
            Err(ServiceError::Other(_))
        ));
    }
}
