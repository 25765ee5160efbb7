// Store trait for dashboard definitions
use crate::domain::dashboard::Dashboard;
use async_trait::async_trait;

/// A dashboard as read from the store, with the opaque version it was read at
#[derive(Debug, Clone)]
pub struct VersionedDashboard {
    pub dashboard: Dashboard,
    pub version: Option<String>,
}

#[async_trait]
pub trait DashboardStore: Send + Sync {
    /// Names of all dashboards starting with `prefix`
    async fn list_dashboards(&self, prefix: &str) -> anyhow::Result<Vec<String>>;

    /// Current definition of a dashboard, `None` if it does not exist
    async fn get_dashboard(&self, name: &str) -> anyhow::Result<Option<VersionedDashboard>>;

    /// Replace a dashboard definition in full and return its new version.
    /// With `expected_version` set the write only succeeds if the stored version still
    /// matches; without it the write is unconditional and the last writer wins.
    async fn put_dashboard(
        &self,
        dashboard: &Dashboard,
        expected_version: Option<&str>,
    ) -> anyhow::Result<Option<String>>;
}
