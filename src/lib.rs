//! bootstage - staged bootstrap build orchestrator
//!
//! This crate provides the library behind the `bootstage` binary: target
//! definitions for a self-hosting generator chain, mtime-based staleness
//! evaluation, and the process plumbing that regenerates stale outputs.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities for bootstage unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording command runner and a fixture
/// project for the bootstrap chain.
#[cfg(test)]
pub mod test_support;

pub use crate::builder::{BuildContext, BuildError};
pub use crate::core::{Dependency, Target, TargetId, TargetSet};
pub use crate::util::context::GlobalContext;
