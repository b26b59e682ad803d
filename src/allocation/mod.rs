//! Guest-to-room allocation: the typed model, the default heuristic and the
//! controller that keeps per-room counts and unseated guests consistent.

mod controller;
mod default;
mod model;

pub use controller::{AllocationController, AllocationObserver, EditOutcome};
pub use default::default_allocation;
pub use model::{
    AllocationState, AllocationSummary, Guest, GuestKind, RoomAllocation, RoomTemplate,
};
