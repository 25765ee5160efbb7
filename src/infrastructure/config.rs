use crate::application::allocation_service::{AllocationSettings, CommitMode};
use crate::domain::capacity::CapacityLimits;
use crate::domain::widget::WidgetTemplate;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AllocatorConfig {
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub limits: CapacityLimits,
    #[serde(default)]
    pub widget: WidgetTemplate,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub prefix: String,
    #[serde(default)]
    pub commit_mode: CommitMode,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Http,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub base_url: String,
    pub token: Option<String>,
    #[serde(default)]
    pub conditional_writes: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl AllocatorConfig {
    pub fn allocation_settings(&self) -> AllocationSettings {
        AllocationSettings {
            dashboard_prefix: self.dashboard.prefix.clone(),
            commit_mode: self.dashboard.commit_mode,
            conditional_writes: self.store.conditional_writes,
        }
    }
}

/// File `config/allocator.*`, then `ALLOCATOR__SECTION__KEY` variables, then `DBOARD_PREFIX`
pub fn load_allocator_config() -> anyhow::Result<AllocatorConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/allocator").required(false))
        .add_source(
            config::Environment::with_prefix("ALLOCATOR")
                .prefix_separator("__")
                .separator("__"),
        )
        .set_override_option("dashboard.prefix", std::env::var("DBOARD_PREFIX").ok())?
        .build()?;

    Ok(settings.try_deserialize()?)
}
