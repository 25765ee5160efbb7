// Provisioning events and allocation results
use super::error::AllocationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const AVAILABLE: &str = "available";

/// Volume creation notification, e.g.
/// `{"resources": ["arn:aws:ec2:ap-northeast-1:123456789012:volume/vol-0abc"], "detail": {"result": "available"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeEvent {
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub detail: Option<EventDetail>,
    #[serde(default)]
    pub params: Option<EventParams>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDetail {
    #[serde(default)]
    pub result: Option<String>,
}

/// Optional routing parameters attached by the trigger
#[derive(Debug, Clone, Deserialize)]
pub struct EventParams {
    #[serde(default)]
    pub dboard_name: Option<String>,
}

impl VolumeEvent {
    pub fn from_value(value: Value) -> Result<Self, AllocationError> {
        serde_json::from_value(value).map_err(|e| AllocationError::InvalidEvent(e.to_string()))
    }

    pub fn from_json(body: &str) -> Result<Self, AllocationError> {
        serde_json::from_str(body).map_err(|e| AllocationError::InvalidEvent(e.to_string()))
    }

    pub fn outcome(&self) -> Result<&str, AllocationError> {
        self.detail
            .as_ref()
            .and_then(|d| d.result.as_deref())
            .ok_or_else(|| AllocationError::InvalidEvent("missing detail.result".to_string()))
    }

    /// Volume id is the path segment after the resource type: `.../volume/vol-0abc` -> `vol-0abc`
    pub fn volume_id(&self) -> Result<String, AllocationError> {
        let resource = self
            .resources
            .first()
            .ok_or_else(|| AllocationError::InvalidEvent("event has no resources".to_string()))?;

        match resource.split('/').nth(1) {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(AllocationError::InvalidResource(resource.clone())),
        }
    }

    /// Dashboard explicitly requested by the trigger, if any
    pub fn dashboard_name(&self) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.dboard_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

/// Queue delivery envelope: each record body is a JSON-encoded `VolumeEvent`
#[derive(Debug, Clone, Deserialize)]
pub struct QueueBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueRecord {
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub status: AllocationStatus,
    pub message: String,
    pub resource_id: Option<String>,
    pub dashboard_name: Option<String>,
    pub response_code: i32,
}

impl AllocationResult {
    pub fn success(resource_id: &str, dashboard_name: &str) -> Self {
        Self {
            status: AllocationStatus::Success,
            message: format!("added volume metrics {} to {}", resource_id, dashboard_name),
            resource_id: Some(resource_id.to_string()),
            dashboard_name: Some(dashboard_name.to_string()),
            response_code: 200,
        }
    }

    pub fn failure(message: String, resource_id: Option<String>, dashboard_name: Option<String>) -> Self {
        Self {
            status: AllocationStatus::Failure,
            message,
            resource_id,
            dashboard_name,
            response_code: -1,
        }
    }

    pub fn not_actionable(outcome: &str) -> Self {
        Self::failure(
            format!("volume creation did not complete (result: {})", outcome),
            None,
            None,
        )
    }

    pub fn is_success(&self) -> bool {
        self.status == AllocationStatus::Success
    }
}
