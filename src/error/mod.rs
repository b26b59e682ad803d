//! Error types shared across the widget, the allocation core and the runtime.

mod types;

pub use types::{AllocationError, Result, ScenarioError, WidgetError};
