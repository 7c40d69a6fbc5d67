use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::prelude::*;
use sfx_core::explorer::{ApplicationInfo, ImageStoreContent, NodeInfo, ServiceInfo};
use sfx_core::manifest::{ClusterManifestResponse, ManifestCache};
use sfx_core::pagination::{aggregate, Page};

/// Cluster connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    pub endpoint: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl ClusterConfig {
    /// Local development cluster HTTP gateway
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:19080";
    pub const DEFAULT_API_VERSION: &'static str = "6.0";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Load configuration from environment variables
    /// Uses SFX_CLUSTER_ENDPOINT, SFX_API_VERSION and SFX_TIMEOUT_SECS, all optional
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout_secs = match lookup("SFX_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map_err(|e| eyre!("Invalid SFX_TIMEOUT_SECS '{}': {}", value, e))?,
            None => Self::DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            endpoint: lookup("SFX_CLUSTER_ENDPOINT")
                .unwrap_or_else(|| Self::DEFAULT_ENDPOINT.to_string()),
            api_version: lookup("SFX_API_VERSION")
                .unwrap_or_else(|| Self::DEFAULT_API_VERSION.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, endpoint: Option<String>) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        self
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// HTTP client for one cluster, plus the manifest cache for that cluster
pub struct ClusterClient {
    config: ClusterConfig,
    http: reqwest::Client,
    manifest: ManifestCache,
}

impl ClusterClient {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            config,
            http,
            manifest: ManifestCache::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn manifest(&self) -> &ManifestCache {
        &self.manifest
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<T, Error> {
        let url = self.config.url(path);
        log::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Fetch one page of a list endpoint
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<String>,
        max_results: Option<usize>,
    ) -> std::result::Result<Page<T>, Error> {
        let mut params = Vec::new();
        if let Some(token) = token {
            params.push(("ContinuationToken", token));
        }
        if let Some(max) = max_results {
            params.push(("MaxResults", max.to_string()));
        }

        self.get(path, &params).await
    }

    /// Walk every page of a list endpoint
    pub async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        aggregate(move |token: Option<String>| self.fetch_page::<T>(path, token, None))
            .await
            .with_context(|| format!("Failed to list {}", path))
    }

    pub async fn list_nodes(&self) -> Result<Vec<NodeInfo>> {
        self.list_all("/Nodes").await
    }

    pub async fn list_applications(&self) -> Result<Vec<ApplicationInfo>> {
        self.list_all("/Applications").await
    }

    pub async fn list_services(&self, application_id: &str) -> Result<Vec<ServiceInfo>> {
        self.list_all(&services_path(application_id)).await
    }

    /// List one image store directory, `None` being the store root
    pub async fn list_image_store(&self, content_path: Option<&str>) -> Result<ImageStoreContent> {
        let path = image_store_path(content_path);
        self.get(&path, &[])
            .await
            .with_context(|| format!("Failed to list {}", path))
    }

    /// Fetch the cluster manifest and replace the cached copy
    pub async fn refresh_manifest(&self) -> Result<()> {
        let response: ClusterManifestResponse = self
            .get("/$/GetClusterManifest", &[])
            .await
            .context("Failed to fetch cluster manifest")?;

        self.manifest.set(response);
        Ok(())
    }
}

/// Application ids use `~` as separator, e.g. `VotingApp~Sub`.
fn services_path(application_id: &str) -> String {
    format!(
        "/Applications/{}/$/GetServices",
        urlencoding::encode(application_id)
    )
}

fn image_store_path(content_path: Option<&str>) -> String {
    match content_path.map(|p| p.trim_matches(['\\', '/'])) {
        Some(p) if !p.is_empty() => format!("/ImageStore/{}", urlencoding::encode(p)),
        _ => "/ImageStore".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = ClusterConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.endpoint, "http://localhost:19080");
        assert_eq!(config.api_version, "6.0");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_config_from_vars() {
        let config = ClusterConfig::from_lookup(lookup_from(&[
            ("SFX_CLUSTER_ENDPOINT", "https://prod:19080"),
            ("SFX_API_VERSION", "8.0"),
            ("SFX_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "https://prod:19080");
        assert_eq!(config.api_version, "8.0");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_invalid_timeout() {
        let result = ClusterConfig::from_lookup(lookup_from(&[("SFX_TIMEOUT_SECS", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_overrides() {
        let config = ClusterConfig::from_lookup(lookup_from(&[]))
            .unwrap()
            .with_overrides(Some("http://other:19080".to_string()));
        assert_eq!(config.endpoint, "http://other:19080");

        let untouched = config.clone().with_overrides(None);
        assert_eq!(untouched, config);
    }

    #[test]
    fn test_url_joins_slashes() {
        let config = ClusterConfig::from_lookup(lookup_from(&[(
            "SFX_CLUSTER_ENDPOINT",
            "http://localhost:19080/",
        )]))
        .unwrap();

        assert_eq!(config.url("/Nodes"), "http://localhost:19080/Nodes");
        assert_eq!(config.url("Nodes"), "http://localhost:19080/Nodes");
    }

    #[test]
    fn test_services_path_encodes_id() {
        assert_eq!(
            services_path("VotingApp~Sub"),
            "/Applications/VotingApp~Sub/$/GetServices"
        );
        assert_eq!(
            services_path("a b"),
            "/Applications/a%20b/$/GetServices"
        );
    }

    #[test]
    fn test_image_store_path() {
        assert_eq!(image_store_path(None), "/ImageStore");
        assert_eq!(image_store_path(Some("\\")), "/ImageStore");
        assert_eq!(
            image_store_path(Some("Store\\VotingType")),
            "/ImageStore/Store%5CVotingType"
        );
    }
}
