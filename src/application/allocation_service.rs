// Allocation service - Use case for adding a new volume's metrics to dashboards
use crate::application::dashboard_store::DashboardStore;
use crate::application::planner::{AllocationPlanner, PlanOutcome};
use crate::domain::dashboard::{Dashboard, DashboardCursor};
use crate::domain::error::AllocationError;
use crate::domain::event::{AVAILABLE, AllocationResult, QueueBatch, QueueRecord, VolumeEvent};
use crate::domain::naming::sequence_order;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// When a batch invocation writes its dashboards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Write after every successfully planned event
    #[default]
    PerEvent,
    /// Write once, after the last event of the invocation
    PerInvocation,
}

#[derive(Debug, Clone)]
pub struct AllocationSettings {
    pub dashboard_prefix: String,
    pub commit_mode: CommitMode,
    pub conditional_writes: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub results: Vec<AllocationResult>,
    pub dashboards_written: Vec<String>,
}

/// Carried from record to record within one batch invocation
#[derive(Debug, Default)]
pub struct BatchState {
    cursor: Option<DashboardCursor>,
    version: Option<String>,
    pending_closed: Vec<(Dashboard, Option<String>)>,
    uncommitted: Vec<usize>,
}

#[derive(Clone)]
pub struct AllocationService {
    store: Arc<dyn DashboardStore>,
    planner: AllocationPlanner,
    settings: AllocationSettings,
}

impl AllocationService {
    pub fn new(store: Arc<dyn DashboardStore>, planner: AllocationPlanner, settings: AllocationSettings) -> Self {
        Self {
            store,
            planner,
            settings,
        }
    }

    /// Single-event trigger: plan and write the dashboard for one volume
    pub async fn handle_event(&self, event: &VolumeEvent) -> AllocationResult {
        let volume_id = match triage(event) {
            Ok(id) => id,
            Err(result) => return result,
        };

        match self.allocate(event.dashboard_name(), &volume_id).await {
            Ok(dashboard_name) => AllocationResult::success(&volume_id, &dashboard_name),
            Err(e) => rejected(e, Some(volume_id)),
        }
    }

    /// Queue trigger: every record is evaluated on its own, while the dashboard being
    /// filled and its running total carry over from one record to the next.
    pub async fn handle_batch(&self, batch: &QueueBatch) -> BatchReport {
        let mut state = BatchState::default();
        let mut report = BatchReport::default();

        for record in &batch.records {
            let result = self.process_record(&mut state, record, &mut report).await;
            report.results.push(result);
        }

        if self.settings.commit_mode == CommitMode::PerInvocation {
            self.flush(&mut state, &mut report).await;
        }

        tracing::info!(
            "Processed {} records, {} succeeded, wrote {:?}",
            report.results.len(),
            report.results.iter().filter(|r| r.is_success()).count(),
            report.dashboards_written
        );
        report
    }

    async fn allocate(&self, requested: Option<&str>, volume_id: &str) -> Result<String, AllocationError> {
        let name = match requested {
            Some(name) => name.to_string(),
            None => self.resolve_current_dashboard().await?,
        };
        tracing::info!("Dashboard: {}, VolumeId: {}", name, volume_id);

        let (cursor, version) = self.load(&name).await?;
        let (outcome, next_version) = self.place(&cursor, version.clone(), volume_id).await?;
        log_outcome(volume_id, &outcome);

        if let Some(closed) = &outcome.closed {
            self.write(closed, version.as_deref()).await?;
        }
        self.write(&outcome.next.dashboard, next_version.as_deref()).await?;

        Ok(outcome.next.dashboard.name)
    }

    async fn process_record(
        &self,
        state: &mut BatchState,
        record: &QueueRecord,
        report: &mut BatchReport,
    ) -> AllocationResult {
        let event = match VolumeEvent::from_json(&record.body) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Skipping record {:?}: {}", record.message_id, e);
                return rejected(e, None);
            }
        };
        let volume_id = match triage(&event) {
            Ok(id) => id,
            Err(result) => return result,
        };

        if state.cursor.is_none() {
            let loaded = match self.resolve_current_dashboard().await {
                Ok(name) => self.load(&name).await,
                Err(e) => Err(e),
            };
            match loaded {
                Ok((cursor, version)) => {
                    state.cursor = Some(cursor);
                    state.version = version;
                }
                Err(e) => return rejected(e, Some(volume_id)),
            }
        }
        let Some(cursor) = state.cursor.as_ref() else {
            return rejected(
                AllocationError::InvalidEvent("no dashboard loaded".to_string()),
                Some(volume_id),
            );
        };
        tracing::info!(
            "Dashboard: {}, VolumeId: {}, entries so far: {}",
            cursor.dashboard.name,
            volume_id,
            cursor.running_total
        );

        let (outcome, next_version) = match self.place(cursor, state.version.clone(), &volume_id).await {
            Ok(placed) => placed,
            Err(e) => return rejected(e, Some(volume_id)),
        };
        log_outcome(&volume_id, &outcome);
        let dashboard_name = outcome.next.dashboard.name.clone();

        match self.settings.commit_mode {
            CommitMode::PerEvent => match self.commit_event(state, outcome, next_version, report).await {
                Ok(()) => AllocationResult::success(&volume_id, &dashboard_name),
                Err(e) => {
                    // store contents are unknown now, reload for the next record
                    state.cursor = None;
                    state.version = None;
                    AllocationResult::failure(e.to_string(), Some(volume_id), Some(dashboard_name))
                }
            },
            CommitMode::PerInvocation => {
                if let Some(closed) = outcome.closed {
                    state.pending_closed.push((closed, state.version.take()));
                }
                state.version = next_version;
                state.cursor = Some(outcome.next);
                state.uncommitted.push(report.results.len());
                AllocationResult::success(&volume_id, &dashboard_name)
            }
        }
    }

    async fn commit_event(
        &self,
        state: &mut BatchState,
        outcome: PlanOutcome,
        next_version: Option<String>,
        report: &mut BatchReport,
    ) -> Result<(), AllocationError> {
        if let Some(closed) = &outcome.closed {
            self.write(closed, state.version.as_deref()).await?;
            report.dashboards_written.push(closed.name.clone());
        }
        let version = self
            .write(&outcome.next.dashboard, next_version.as_deref())
            .await?;
        report.dashboards_written.push(outcome.next.dashboard.name.clone());
        state.version = version;
        state.cursor = Some(outcome.next);
        Ok(())
    }

    /// Final write of a per-invocation batch. Closed dashboards go first. When a write
    /// fails, only results planned into dashboards that were not written become failures.
    async fn flush(&self, state: &mut BatchState, report: &mut BatchReport) {
        if state.uncommitted.is_empty() {
            return;
        }

        let mut written = Vec::new();
        let mut failure = None;
        for (dashboard, version) in std::mem::take(&mut state.pending_closed) {
            if let Err(e) = self.write(&dashboard, version.as_deref()).await {
                failure = Some(e);
                break;
            }
            written.push(dashboard.name);
        }
        if failure.is_none() {
            if let Some(cursor) = &state.cursor {
                match self.write(&cursor.dashboard, state.version.as_deref()).await {
                    Ok(_) => written.push(cursor.dashboard.name.clone()),
                    Err(e) => failure = Some(e),
                }
            }
        }

        if let Some(e) = failure {
            tracing::error!("Batch commit stopped after {:?}: {}", written, e);
            for index in state.uncommitted.drain(..) {
                let Some(result) = report.results.get_mut(index) else {
                    continue;
                };
                let committed = result
                    .dashboard_name
                    .as_ref()
                    .is_some_and(|name| written.contains(name));
                if !committed {
                    *result = AllocationResult::failure(
                        e.to_string(),
                        result.resource_id.take(),
                        result.dashboard_name.take(),
                    );
                }
            }
        }
        state.uncommitted.clear();
        report.dashboards_written.extend(written);
    }

    /// Plans `volume_id` from `cursor`, whose dashboard was read at `version`. A rollover
    /// into a dashboard that already exists in the store is planned again against the
    /// stored copy, so the successor is extended instead of replaced; stored successors
    /// that are themselves full are skipped and left untouched. Returns the plan together
    /// with the version to write `next` against.
    async fn place(
        &self,
        cursor: &DashboardCursor,
        version: Option<String>,
        volume_id: &str,
    ) -> Result<(PlanOutcome, Option<String>), AllocationError> {
        let mut outcome = self.planner.plan(cursor, volume_id)?;
        let Some(closed) = outcome.closed.take() else {
            return Ok((outcome, version));
        };

        let mut next_version = None;
        loop {
            let name = outcome.next.dashboard.name.clone();
            let stored = self
                .store
                .get_dashboard(&name)
                .await
                .with_context(|| format!("reading dashboard {}", name))?;
            let Some(stored) = stored else {
                break;
            };

            tracing::info!("Dashboard {} already exists, continuing in it", name);
            outcome = self
                .planner
                .plan(&DashboardCursor::open(stored.dashboard), volume_id)?;
            if outcome.closed.take().is_none() {
                next_version = stored.version;
                break;
            }
            tracing::info!("Dashboard {} is full as well, skipping it", name);
        }

        outcome.closed = Some(closed);
        Ok((outcome, next_version))
    }

    /// Highest dashboard in the configured name sequence, or the bare prefix if none exist
    async fn resolve_current_dashboard(&self) -> Result<String, AllocationError> {
        let prefix = &self.settings.dashboard_prefix;
        let names = self
            .store
            .list_dashboards(prefix)
            .await
            .with_context(|| format!("listing dashboards with prefix {}", prefix))?;

        Ok(names
            .into_iter()
            .max_by(|a, b| sequence_order(a, b))
            .unwrap_or_else(|| prefix.clone()))
    }

    async fn load(&self, name: &str) -> Result<(DashboardCursor, Option<String>), AllocationError> {
        let stored = self
            .store
            .get_dashboard(name)
            .await
            .with_context(|| format!("reading dashboard {}", name))?;

        Ok(match stored {
            Some(stored) => (DashboardCursor::open(stored.dashboard), stored.version),
            None => {
                tracing::info!("Dashboard {} does not exist yet, starting empty", name);
                (DashboardCursor::open(Dashboard::empty(name)), None)
            }
        })
    }

    async fn write(&self, dashboard: &Dashboard, expected_version: Option<&str>) -> Result<Option<String>, AllocationError> {
        let expected_version = expected_version.filter(|_| self.settings.conditional_writes);
        if tracing::enabled!(tracing::Level::DEBUG) {
            let body = serde_json::to_string(&dashboard.to_body()).unwrap_or_default();
            tracing::debug!("Writing dashboard {}:\n{}", dashboard.name, body);
        }

        let version = self
            .store
            .put_dashboard(dashboard, expected_version)
            .await
            .with_context(|| format!("writing dashboard {}", dashboard.name))?;
        Ok(version)
    }
}

/// Volume id of an actionable event, or the result to report for one that is not
fn triage(event: &VolumeEvent) -> Result<String, AllocationResult> {
    let outcome = event.outcome().map_err(|e| rejected(e, None))?;
    if outcome != AVAILABLE {
        tracing::warn!("Ignoring volume event with result {}", outcome);
        return Err(AllocationResult::not_actionable(outcome));
    }
    event.volume_id().map_err(|e| rejected(e, None))
}

fn rejected(err: AllocationError, resource_id: Option<String>) -> AllocationResult {
    tracing::error!("Allocation failed: {}", err);
    AllocationResult::failure(err.to_string(), resource_id, None)
}

fn log_outcome(volume_id: &str, outcome: &PlanOutcome) {
    if let Some(closed) = &outcome.closed {
        tracing::info!(
            "Closed dashboard {}, created {}",
            closed.name,
            outcome.next.dashboard.name
        );
    }
    tracing::info!(
        "Volume {} planned into {}: created {:?}, extended {:?}, total entries {}",
        volume_id,
        outcome.next.dashboard.name,
        outcome.created,
        outcome.extended,
        outcome.next.running_total
    );
}
