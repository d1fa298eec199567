use thiserror::Error;

use crate::model::StepId;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("step id must not be empty")]
    EmptyId,
    #[error("step id {0} is reserved for junction and goal nodes")]
    ReservedId(String),
    #[error("step {id}: position_x and position_y must both be set to finite numbers")]
    InvalidPosition { id: String },
}

/// Failures reported by a [`crate::api::StepApi`] backend.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("step {0} not found")]
    NotFound(StepId),
    #[error("request rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum QuestMapError {
    /// The step list could not be loaded; the page shows a banner instead of the map.
    #[error("failed to load steps: {0}")]
    Fetch(#[source] ApiError),
    #[error("quest map is read-only for this viewer")]
    ReadOnly,
    #[error("unknown step {0}")]
    UnknownStep(StepId),
    #[error(transparent)]
    Api(#[from] ApiError),
}
