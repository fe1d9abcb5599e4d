//! Small standalone helpers that don't belong to any one component.

pub mod math;
