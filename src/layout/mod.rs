//! Layout solving: nested row/column containers resolved into zone rectangles.

mod core;

pub use core::{Constraint, Direction, LayoutNode, LayoutTree, NodeId};
