// Allocation error taxonomy
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("cannot extract volume id from resource '{0}'")]
    InvalidResource(String),

    #[error("widget '{widget}' has unparseable series id '{id}'")]
    MalformedSeriesId { widget: String, id: String },

    #[error("'{name}' exceeds the maximum sequence length of {limit}")]
    SequenceExhausted { name: String, limit: u64 },

    #[error("dashboard store error: {0:#}")]
    Store(#[from] anyhow::Error),
}
