//! Activation state module
//!
//! Tracks which modes are live:
//! - Root: only the global mode's commands are enabled
//! - Nested: child modes stacked on the root, innermost enabled
//! - ExclusiveOverride: one mode enabled in place of the normal set

mod machine;

pub use machine::{ActivationEngine, ActivationError, State};
