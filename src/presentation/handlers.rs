// HTTP request handlers
use crate::application::allocation_service::BatchReport;
use crate::domain::event::{AllocationResult, QueueBatch, VolumeEvent};
use crate::presentation::app_state::AppState;
use axum::{Json, extract::State};
use serde_json::Value;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// A single volume notification. Malformed events are answered with a failure result.
pub async fn volume_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Json<AllocationResult> {
    let result = match VolumeEvent::from_value(body) {
        Ok(event) => state.allocation_service.handle_event(&event).await,
        Err(e) => {
            tracing::warn!("Rejected volume event: {}", e);
            AllocationResult::failure(e.to_string(), None, None)
        }
    };
    Json(result)
}

/// A queue delivery carrying several volume notifications
pub async fn volume_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Json<BatchReport> {
    let report = match serde_json::from_value::<QueueBatch>(body) {
        Ok(batch) => state.allocation_service.handle_batch(&batch).await,
        Err(e) => {
            tracing::warn!("Rejected queue batch: {}", e);
            BatchReport {
                results: vec![AllocationResult::failure(
                    format!("invalid batch: {}", e),
                    None,
                    None,
                )],
                dashboards_written: Vec::new(),
            }
        }
    };
    Json(report)
}
