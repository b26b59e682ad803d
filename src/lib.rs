//! Hotel room allocation widget for the terminal.
//!
//! A party of adults and children is spread over an ordered list of rooms,
//! one adult per room to start with. The user then adjusts each room's counts
//! through stepper inputs; every edit is checked against room capacity and the
//! guests still unallocated, the room price is recomputed, and the sanitized
//! allocation is handed to an observer.
//!
//! The allocation core (`allocation`, `stepper`) is independent of the
//! terminal. `widget` renders it through the plugin runtime in `runtime`.

pub mod allocation;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod stepper;
pub mod widget;
pub mod width;

pub use allocation::{
    AllocationController, AllocationObserver, AllocationState, AllocationSummary, EditOutcome,
    Guest, GuestKind, RoomAllocation, RoomTemplate, default_allocation,
};
pub use config::{AllocationScenario, ValidationPolicy, WidgetConfig};
pub use error::{AllocationError, Result, ScenarioError, WidgetError};
pub use geometry::{Rect, Size};
pub use layout::{Constraint, Direction, LayoutNode, LayoutTree};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{MetricSnapshot, WidgetMetrics};
pub use registry::{ZoneContent, ZoneId, ZoneRegistry};
pub use render::{AnsiRenderer, RendererSettings};
pub use runtime::diagnostics::{LifecycleLoggerPlugin, MetricsSnapshotPlugin};
pub use runtime::driver::cli::{CliDriver, CliDriverError, DriverResult, TerminalModes};
pub use runtime::focus::{FocusMove, FocusRing};
pub use runtime::{
    EventFlow, PluginBundle, RoomPlugin, RoomRuntime, RuntimeConfig, RuntimeContext, RuntimeEvent,
};
pub use stepper::{StepperBounds, StepperChange, StepperInput};
pub use widget::{RoomAllocationPlugin, allocation_layout};
pub use width::display_width;
