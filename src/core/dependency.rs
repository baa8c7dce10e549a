//! Dependency specification.
//!
//! A Dependency is either a plain file, compared by modification time, or
//! another target, resolved by evaluating that target.

use std::fmt;
use std::path::PathBuf;

use crate::core::target::TargetId;

/// A single dependency of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// A leaf file, relative to the project root.
    File(PathBuf),
    /// Another target in the same set.
    Target(TargetId),
}

impl Dependency {
    /// Create a file dependency.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Dependency::File(path.into())
    }

    /// Create a target dependency.
    pub fn target(id: TargetId) -> Self {
        Dependency::Target(id)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::File(path) => write!(f, "{}", path.display()),
            Dependency::Target(id) => write!(f, "target `{}`", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_constructors() {
        assert_eq!(
            Dependency::file("peg.peg"),
            Dependency::File(PathBuf::from("peg.peg"))
        );
        assert_eq!(
            Dependency::target(TargetId::Peg3),
            Dependency::Target(TargetId::Peg3)
        );
        assert_ne!(Dependency::file("peg3"), Dependency::target(TargetId::Peg3));
    }

    #[test]
    fn test_dependency_display() {
        assert_eq!(Dependency::file("main.go").to_string(), "main.go");
        assert_eq!(
            Dependency::target(TargetId::PegBootstrap).to_string(),
            "target `peg-bootstrap`"
        );
    }
}
