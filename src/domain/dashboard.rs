// Dashboard domain model
use super::widget::Widget;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub name: String,
    pub widgets: Vec<Widget>,
}

/// Persisted dashboard body. The name is addressed separately by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardBody {
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

impl Dashboard {
    pub fn new(name: String, widgets: Vec<Widget>) -> Self {
        Self { name, widgets }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name.into(), Vec::new())
    }

    pub fn from_body(name: String, body: DashboardBody) -> Self {
        Self::new(name, body.widgets)
    }

    pub fn to_body(&self) -> DashboardBody {
        DashboardBody {
            widgets: self.widgets.clone(),
        }
    }

    /// Entries across every widget, managed or not
    pub fn entry_count(&self) -> usize {
        self.widgets.iter().map(|w| w.entries().len()).sum()
    }
}

/// The dashboard currently receiving metrics, and how many entries it holds
/// including everything planned into it so far.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardCursor {
    pub dashboard: Dashboard,
    pub running_total: usize,
}

impl DashboardCursor {
    pub fn open(dashboard: Dashboard) -> Self {
        let running_total = dashboard.entry_count();
        Self {
            dashboard,
            running_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metric::{MetricAssignment, MetricKind};
    use crate::domain::widget::WidgetBuilder;

    #[test]
    fn test_cursor_counts_all_entries() {
        let builder = WidgetBuilder::default();
        let managed = builder.create_widget(
            "VolumeReadBytes",
            &[
                MetricAssignment::new(MetricKind::ReadBytes, "a"),
                MetricAssignment::new(MetricKind::ReadBytes, "b"),
            ],
        );
        let foreign: Widget =
            serde_json::from_value(serde_json::json!({"title": "CPU", "entries": [["AWS/EC2", "CPUUtilization"]]}))
                .unwrap();

        let cursor = DashboardCursor::open(Dashboard::new("ebs".to_string(), vec![managed, foreign]));
        assert_eq!(cursor.running_total, 5);
    }

    #[test]
    fn test_body_json_shape() {
        let body: DashboardBody = serde_json::from_str(r#"{"widgets": [{"title": "Notes"}]}"#).unwrap();
        let dashboard = Dashboard::from_body("ebs".to_string(), body);
        assert_eq!(dashboard.widgets.len(), 1);
        assert_eq!(
            serde_json::to_value(dashboard.to_body()).unwrap(),
            serde_json::json!({"widgets": [{"title": "Notes"}]})
        );
    }
}
