//! Zone registry: the last content written to each solved zone, and which
//! zones need repainting.

mod core;

pub use core::{ZoneContent, ZoneId, ZoneRegistry, ZoneState};
