//! Core data structures for bootstage.
//!
//! - Target identities and definitions
//! - Dependencies (files and other targets)
//! - The target set a run evaluates against

pub mod dependency;
pub mod target;
pub mod target_set;

pub use dependency::Dependency;
pub use target::{Action, RunPolicy, Step, Target, TargetId};
pub use target_set::TargetSet;
