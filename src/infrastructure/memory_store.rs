// In-process dashboard store, for local runs and tests
use crate::application::dashboard_store::{DashboardStore, VersionedDashboard};
use crate::domain::dashboard::Dashboard;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryDashboardStore {
    dashboards: RwLock<BTreeMap<String, (Dashboard, u64)>>,
    writes: AtomicUsize,
}

impl MemoryDashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dashboards(dashboards: impl IntoIterator<Item = Dashboard>) -> Self {
        let map = dashboards
            .into_iter()
            .map(|d| (d.name.clone(), (d, 1)))
            .collect();
        Self {
            dashboards: RwLock::new(map),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of successful writes since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DashboardStore for MemoryDashboardStore {
    async fn list_dashboards(&self, prefix: &str) -> Result<Vec<String>> {
        let dashboards = self.dashboards.read().await;
        Ok(dashboards
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn get_dashboard(&self, name: &str) -> Result<Option<VersionedDashboard>> {
        let dashboards = self.dashboards.read().await;
        Ok(dashboards.get(name).map(|(dashboard, version)| VersionedDashboard {
            dashboard: dashboard.clone(),
            version: Some(version.to_string()),
        }))
    }

    async fn put_dashboard(&self, dashboard: &Dashboard, expected_version: Option<&str>) -> Result<Option<String>> {
        let mut dashboards = self.dashboards.write().await;
        let current = dashboards.get(&dashboard.name).map(|(_, v)| *v);

        if let Some(expected) = expected_version {
            let found = current.map(|v| v.to_string());
            if found.as_deref() != Some(expected) {
                anyhow::bail!(
                    "version conflict on {}: expected {}, found {}",
                    dashboard.name,
                    expected,
                    found.as_deref().unwrap_or("none")
                );
            }
        }

        let version = current.map_or(1, |v| v + 1);
        dashboards.insert(dashboard.name.clone(), (dashboard.clone(), version));
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(Some(version.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_versions_and_conflicts() {
        let store = MemoryDashboardStore::new();
        let dashboard = Dashboard::empty("ebs");

        assert!(store.get_dashboard("ebs").await.unwrap().is_none());
        assert_eq!(store.put_dashboard(&dashboard, None).await.unwrap().as_deref(), Some("1"));
        assert_eq!(
            store.put_dashboard(&dashboard, Some("1")).await.unwrap().as_deref(),
            Some("2")
        );
        assert!(store.put_dashboard(&dashboard, Some("1")).await.is_err());
        assert_eq!(store.write_count(), 2);

        let stored = store.get_dashboard("ebs").await.unwrap().unwrap();
        assert_eq!(stored.version.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let store = MemoryDashboardStore::with_dashboards(vec![
            Dashboard::empty("ebs"),
            Dashboard::empty("ebs-2"),
            Dashboard::empty("rds"),
        ]);
        assert_eq!(store.list_dashboards("ebs").await.unwrap(), vec!["ebs", "ebs-2"]);
    }
}
