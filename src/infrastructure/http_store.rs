// HTTP dashboard store implementation
use crate::application::dashboard_store::{DashboardStore, VersionedDashboard};
use crate::domain::dashboard::{Dashboard, DashboardBody};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ETAG, IF_MATCH};
use serde::Deserialize;

/// Talks to a dashboard API exposing
/// `GET /dashboards?prefix=`, `GET /dashboards/{name}` and `PUT /dashboards/{name}`.
#[derive(Debug, Clone)]
pub struct HttpDashboardStore {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DashboardListResponse {
    #[serde(default)]
    dashboards: Vec<DashboardEntry>,
}

#[derive(Debug, Deserialize)]
struct DashboardEntry {
    name: String,
}

impl HttpDashboardStore {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn list_url(&self, prefix: &str) -> String {
        format!(
            "{}/dashboards?prefix={}",
            self.base_url,
            urlencoding::encode(prefix)
        )
    }

    fn dashboard_url(&self, name: &str) -> String {
        format!("{}/dashboards/{}", self.base_url, urlencoding::encode(name))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl DashboardStore for HttpDashboardStore {
    async fn list_dashboards(&self, prefix: &str) -> Result<Vec<String>> {
        let url = self.list_url(prefix);
        let response = self
            .authorized(self.client.get(&url))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send list request to dashboard store")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Dashboard listing failed with status {}: {}", status, body);
        }

        let data = response
            .json::<DashboardListResponse>()
            .await
            .context("Failed to parse dashboard listing")?;

        tracing::debug!("Found {} dashboards with prefix {}", data.dashboards.len(), prefix);
        Ok(data.dashboards.into_iter().map(|d| d.name).collect())
    }

    async fn get_dashboard(&self, name: &str) -> Result<Option<VersionedDashboard>> {
        let url = self.dashboard_url(name);
        let response = self
            .authorized(self.client.get(&url))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send get request to dashboard store")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reading dashboard {} failed with status {}: {}", name, status, body);
        }

        let version = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response
            .json::<DashboardBody>()
            .await
            .with_context(|| format!("Failed to parse body of dashboard {}", name))?;

        Ok(Some(VersionedDashboard {
            dashboard: Dashboard::from_body(name.to_string(), body),
            version,
        }))
    }

    async fn put_dashboard(&self, dashboard: &Dashboard, expected_version: Option<&str>) -> Result<Option<String>> {
        let url = self.dashboard_url(&dashboard.name);
        let mut request = self.authorized(self.client.put(&url)).json(&dashboard.to_body());
        if let Some(version) = expected_version {
            request = request.header(IF_MATCH, version);
        }

        let response = request
            .send()
            .await
            .context("Failed to send put request to dashboard store")?;

        if response.status() == StatusCode::PRECONDITION_FAILED {
            anyhow::bail!(
                "version conflict on {}: dashboard changed since it was read",
                dashboard.name
            );
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Writing dashboard {} failed with status {}: {}",
                dashboard.name,
                status,
                body
            );
        }

        Ok(response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()))
    }
}
