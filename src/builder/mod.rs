//! Build engine: per-run context, staleness evaluation, and action execution.

pub mod action;
pub mod cache;
pub mod context;
pub mod errors;
pub mod freshness;

pub use cache::EvaluationCache;
pub use context::{BuildContext, DirGuard};
pub use errors::BuildError;
