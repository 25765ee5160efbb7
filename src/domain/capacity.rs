// Capacity limits and the fit checks that drive rollover
use super::error::AllocationError;
use super::naming::sequence_number;
use super::widget::Widget;
use serde::Deserialize;

/// Each metric occupies a raw series entry plus its derived entry
pub const ENTRIES_PER_METRIC: usize = 2;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CapacityLimits {
    #[serde(default = "default_max_entries_per_widget")]
    pub max_entries_per_widget: usize,
    #[serde(default = "default_max_entries_per_dashboard")]
    pub max_entries_per_dashboard: usize,
    #[serde(default = "default_max_sequence")]
    pub max_sequence: u64,
}

fn default_max_entries_per_widget() -> usize {
    100
}

fn default_max_entries_per_dashboard() -> usize {
    400
}

fn default_max_sequence() -> u64 {
    1000
}

impl Default for CapacityLimits {
    fn default() -> Self {
        Self {
            max_entries_per_widget: default_max_entries_per_widget(),
            max_entries_per_dashboard: default_max_entries_per_dashboard(),
            max_sequence: default_max_sequence(),
        }
    }
}

/// False when `entries > max - incoming * 2`
pub fn fits_in_widget(widget: &Widget, incoming_metrics: usize, limits: &CapacityLimits) -> bool {
    let incoming = incoming_metrics.saturating_mul(ENTRIES_PER_METRIC);
    match limits.max_entries_per_widget.checked_sub(incoming) {
        Some(room) => widget.entries().len() <= room,
        None => false,
    }
}

/// False when `running + incoming >= max`
pub fn fits_in_dashboard(running_total: usize, incoming_entries: usize, limits: &CapacityLimits) -> bool {
    running_total.saturating_add(incoming_entries) < limits.max_entries_per_dashboard
}

/// Rejects names whose sequence number runs past the configured maximum
pub fn check_sequence(name: &str, limits: &CapacityLimits) -> Result<(), AllocationError> {
    if sequence_number(name) > limits.max_sequence {
        return Err(AllocationError::SequenceExhausted {
            name: name.to_string(),
            limit: limits.max_sequence,
        });
    }
    Ok(())
}
