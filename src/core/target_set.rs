//! The set of targets known to a run.

use std::collections::BTreeMap;
use std::path::Path;

use crate::builder::errors::BuildError;
use crate::core::target::{Target, TargetId};

/// Targets indexed by identity.
///
/// Output paths are owned exclusively: two targets can never claim the
/// same artifact.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: BTreeMap<TargetId, Target>,
}

impl TargetSet {
    /// Create an empty set.
    pub fn new() -> Self {
        TargetSet {
            targets: BTreeMap::new(),
        }
    }

    /// Register a target, replacing any previous definition with the same id.
    pub fn insert(&mut self, target: Target) -> Result<(), BuildError> {
        if let Some(output) = target.output() {
            if let Some(owner) = self.owner_of(output) {
                if owner != target.id() {
                    return Err(BuildError::DuplicateOutput {
                        path: output.to_path_buf(),
                        first: owner,
                        second: target.id(),
                    });
                }
            }
        }

        self.targets.insert(target.id(), target);
        Ok(())
    }

    /// Builder-style `insert`.
    pub fn with(mut self, target: Target) -> Result<Self, BuildError> {
        self.insert(target)?;
        Ok(self)
    }

    /// Look up a target.
    pub fn get(&self, id: TargetId) -> Result<&Target, BuildError> {
        self.targets
            .get(&id)
            .ok_or(BuildError::UndefinedTarget { id })
    }

    /// Whether a target is registered.
    pub fn contains(&self, id: TargetId) -> bool {
        self.targets.contains_key(&id)
    }

    /// The target producing `output`, if any.
    pub fn owner_of(&self, output: &Path) -> Option<TargetId> {
        self.targets
            .values()
            .find(|t| t.output() == Some(output))
            .map(Target::id)
    }

    /// All targets in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
