//! High-level operations.
//!
//! This module contains the implementation of bootstage commands.

pub mod bootstrap;
pub mod buildinfo;
pub mod clean;
pub mod run;

pub use bootstrap::{targets, Grammar, GRAMMARS};
pub use buildinfo::{buildinfo, BuildInfo};
pub use clean::{clean, CleanReport};
pub use run::{run, Outcome, Request, DEFAULT_TARGET};
