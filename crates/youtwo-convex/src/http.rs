//! Convex HTTP actions client
//!
//! Talks to the deployment's `*.convex.site` HTTP router:
//! `GET /graph`, `GET /metadata` and `POST /sources`.

use crate::error::{ConvexError, ConvexResult};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use youtwo_core::{ConvexConfig, GraphEndpoint, GraphResult, CONVEX_URL_ENV};

/// Timeout for [`ConvexHttpClient::check_connection`]
pub const CONNECTION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// A document record registered with the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub filename: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "partsCount")]
    pub parts_count: u32,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(rename = "sourceInfo", default)]
    source_info: Option<Vec<SourceInfo>>,
}

#[derive(Debug, Deserialize)]
struct SourceInfo {
    filename: String,
}

/// Turn a deployment URL into the HTTP actions base URL.
///
/// `convex.cloud` becomes `convex.site` and trailing slashes are dropped; the
/// result must end with `.site`.
pub fn site_url(url: &str) -> ConvexResult<String> {
    let site = url.trim().replace("convex.cloud", "convex.site");
    let site = site.trim_end_matches('/');
    if !site.ends_with(".site") {
        return Err(ConvexError::InvalidUrl(url.to_string()));
    }
    Ok(site.to_string())
}

#[derive(Debug, Clone)]
pub struct ConvexHttpClient {
    client: Client,
    base_url: String,
}

impl ConvexHttpClient {
    /// Client for a `*.convex.cloud` or `*.convex.site` deployment URL
    pub fn new(deployment_url: &str) -> ConvexResult<Self> {
        Ok(Self::with_base_url(Client::new(), site_url(deployment_url)?))
    }

    /// Client for an already-resolved base URL, used as-is
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// URL from config, else `CONVEX_URL`
    pub fn from_config(config: &ConvexConfig) -> ConvexResult<Self> {
        match &config.url {
            Some(url) => Self::new(url),
            None => Self::from_env(),
        }
    }

    pub fn from_env() -> ConvexResult<Self> {
        let url = std::env::var(CONVEX_URL_ENV).map_err(|_| ConvexError::MissingUrl)?;
        Self::new(&url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /graph`: the raw `{entities, relations}` document
    pub async fn get_graph(&self) -> ConvexResult<Value> {
        self.call(Method::GET, "graph", None, None).await
    }

    /// `GET /metadata`: filenames of every registered source.
    ///
    /// A response without `sourceInfo` yields an empty list.
    pub async fn list_source_filenames(&self) -> ConvexResult<Vec<String>> {
        let value = self.call(Method::GET, "metadata", None, None).await?;
        let metadata: MetadataResponse = serde_json::from_value(value)
            .map_err(|e| ConvexError::decode(format!("metadata: {e}")))?;

        match metadata.source_info {
            Some(sources) => Ok(sources.into_iter().map(|s| s.filename).collect()),
            None => {
                warn!("No source info found in Convex metadata");
                Ok(Vec::new())
            }
        }
    }

    /// `POST /sources` with `{"sources": [...]}`
    pub async fn upload_sources(&self, sources: &[SourceRecord]) -> ConvexResult<Value> {
        let body = serde_json::json!({ "sources": sources });
        self.call(Method::POST, "sources", Some(body), None).await
    }

    /// Whether `GET /metadata` answers within [`CONNECTION_CHECK_TIMEOUT`]
    pub async fn check_connection(&self) -> bool {
        match self
            .call(Method::GET, "metadata", None, Some(CONNECTION_CHECK_TIMEOUT))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!("Convex connection check failed: {}", e);
                false
            }
        }
    }

    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        timeout: Option<Duration>,
    ) -> ConvexResult<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConvexError::Status {
                method: method.to_string(),
                url,
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ConvexError::decode(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl GraphEndpoint for ConvexHttpClient {
    fn describe(&self) -> String {
        format!("Convex HTTP {}", self.base_url)
    }

    async fn fetch_graph(&self) -> GraphResult<Value> {
        Ok(self.get_graph().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_url_rewrites_cloud() {
        assert_eq!(
            site_url("https://happy-otter-123.convex.cloud/").unwrap(),
            "https://happy-otter-123.convex.site"
        );
        assert_eq!(
            site_url("https://happy-otter-123.convex.site").unwrap(),
            "https://happy-otter-123.convex.site"
        );
    }

    #[test]
    fn test_site_url_rejects_other_hosts() {
        let err = site_url("http://localhost:3210").unwrap_err();
        assert!(matches!(err, ConvexError::InvalidUrl(_)));
    }

    #[test]
    fn test_from_config_uses_url() {
        let config = ConvexConfig {
            url: Some("https://a.convex.cloud".to_string()),
            ..Default::default()
        };
        let client = ConvexHttpClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://a.convex.site");
        assert_eq!(client.describe(), "Convex HTTP https://a.convex.site");
    }

    #[test]
    fn test_source_record_wire_names() {
        let record = SourceRecord {
            filename: "doc.md".to_string(),
            title: "Doc".to_string(),
            kind: "Vectara".to_string(),
            parts_count: 3,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "Vectara");
        assert_eq!(value["partsCount"], 3);
    }
}
