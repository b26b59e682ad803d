use thiserror::Error;

/// Unified result type for the widget crate.
pub type Result<T> = std::result::Result<T, WidgetError>;

/// Errors surfaced by the runtime and widget plumbing.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("layout tree is empty")]
    EmptyLayout,
    #[error("zone `{0}` not found")]
    ZoneNotFound(String),
    #[error("allocation error: {0}")]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors returned by the allocation controller.
///
/// Invalid counts are corrected, never reported; only addressing a room that
/// does not exist is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("room {index} out of range ({len} rooms)")]
    RoomOutOfRange { index: usize, len: usize },
}

/// Problems found while loading a guest/room scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario has no rooms")]
    NoRooms,
    #[error("room {index} has zero capacity")]
    ZeroCapacity { index: usize },
    #[error("invalid scenario json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),
}
