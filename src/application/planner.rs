// Allocation planner - Places one volume's metrics into the current dashboard
use crate::domain::capacity::{
    CapacityLimits, ENTRIES_PER_METRIC, check_sequence, fits_in_dashboard, fits_in_widget,
};
use crate::domain::classifier::classify;
use crate::domain::dashboard::{Dashboard, DashboardCursor};
use crate::domain::error::AllocationError;
use crate::domain::metric::{MetricAssignment, MetricKind};
use crate::domain::naming::{next_dashboard_name, next_widget_title, sequence_order};
use crate::domain::widget::{Widget, WidgetBuilder};

/// Result of planning one volume
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Dashboard that ran out of room, unchanged. Must be written before `next`.
    pub closed: Option<Dashboard>,
    /// Dashboard holding the new metrics
    pub next: DashboardCursor,
    /// Titles of widgets created for this volume
    pub created: Vec<String>,
    /// Titles of existing widgets the volume was appended to
    pub extended: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AllocationPlanner {
    limits: CapacityLimits,
    builder: WidgetBuilder,
}

impl AllocationPlanner {
    pub fn new(limits: CapacityLimits, builder: WidgetBuilder) -> Self {
        Self { limits, builder }
    }

    /// Plans the four metrics of `volume_id` into the cursor's dashboard, or into a
    /// successor dashboard when the current one cannot take them. The input is not
    /// modified; nothing is returned unless the whole plan succeeded.
    pub fn plan(&self, cursor: &DashboardCursor, volume_id: &str) -> Result<PlanOutcome, AllocationError> {
        let assignments = MetricAssignment::for_volume(volume_id);
        let incoming = assignments.len() * ENTRIES_PER_METRIC;

        let (closed, working, mut running_total) =
            if fits_in_dashboard(cursor.running_total, incoming, &self.limits) {
                (None, cursor.dashboard.clone(), cursor.running_total)
            } else {
                let name = next_dashboard_name(&cursor.dashboard.name);
                check_sequence(&name, &self.limits)?;
                tracing::info!(
                    "Dashboard {} is full ({} entries), continuing in {}",
                    cursor.dashboard.name,
                    cursor.running_total,
                    name
                );
                (Some(cursor.dashboard.clone()), Dashboard::empty(name), 0)
            };

        let Dashboard { name, widgets } = working;
        let mut classification = classify(widgets);
        let mut output = std::mem::take(&mut classification.unmanaged);
        let mut created = Vec::new();
        let mut extended = Vec::new();

        for kind in MetricKind::ALL {
            let metrics: Vec<MetricAssignment> = assignments
                .iter()
                .filter(|a| a.kind == kind)
                .cloned()
                .collect();
            running_total += metrics.len() * ENTRIES_PER_METRIC;

            let bucket = classification.take_bucket(kind);
            let Some((earlier, active)) = split_active(bucket) else {
                let widget = self.builder.create_widget(kind.default_title(), &metrics);
                created.push(widget.title().to_string());
                output.push(widget);
                continue;
            };

            output.extend(earlier);
            if fits_in_widget(&active, metrics.len(), &self.limits) {
                let widget = self.builder.extend_widget(active, &metrics)?;
                extended.push(widget.title().to_string());
                output.push(widget);
            } else {
                let title = next_widget_title(active.title());
                check_sequence(&title, &self.limits)?;
                tracing::info!("Widget {} is full, starting {}", active.title(), title);
                output.push(active);
                let widget = self.builder.create_widget(&title, &metrics);
                created.push(widget.title().to_string());
                output.push(widget);
            }
        }

        Ok(PlanOutcome {
            closed,
            next: DashboardCursor {
                dashboard: Dashboard::new(name, output),
                running_total,
            },
            created,
            extended,
        })
    }
}

/// Separates the widget highest in title sequence from the rest, which keep their order
fn split_active(mut bucket: Vec<Widget>) -> Option<(Vec<Widget>, Widget)> {
    let active = bucket
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| sequence_order(a.title(), b.title()))
        .map(|(i, _)| i)?;
    let widget = bucket.remove(active);
    Some((bucket, widget))
}
