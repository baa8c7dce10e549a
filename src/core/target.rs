//! Target definitions - what gets built.
//!
//! A Target is a named unit of build work: an optional output artifact,
//! the dependencies it is checked against, and the action that
//! regenerates the output when it is stale.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::dependency::Dependency;
use crate::util::process::Invocation;

/// Stable identity of a target.
///
/// Identity is assigned at definition time and doubles as the key of the
/// per-run evaluation cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetId {
    /// Baseline generator built from the hand-written bootstrap source.
    Bootstrap,
    /// Stage 0: generator built from the bootstrap generator's output.
    Peg0,
    /// Stage 1: produced by stage 0 from the bootstrap grammar.
    Peg1,
    /// Stage 2: produced by stage 1 from the reduced generator grammar.
    Peg2,
    /// Stage 3: produced by stage 2 from the full generator grammar.
    Peg3,
    /// Final bootstrap stage.
    PegBootstrap,
    /// The generator's own generated source, regenerated by the final stage.
    PegPegGo,
    /// The production generator binary.
    Peg,
    GrammarC,
    GrammarCalculator,
    GrammarCalculatorAst,
    GrammarFexl,
    GrammarJava,
    GrammarLongTest,
    /// Build the production binary and every grammar.
    All,
    /// Regenerate every grammar, then run the test suite.
    Test,
    /// Force the production binary, then run the benchmarks.
    Bench,
}

impl TargetId {
    /// Every target, in declaration order.
    pub const ALL: [TargetId; 17] = [
        TargetId::Bootstrap,
        TargetId::Peg0,
        TargetId::Peg1,
        TargetId::Peg2,
        TargetId::Peg3,
        TargetId::PegBootstrap,
        TargetId::PegPegGo,
        TargetId::Peg,
        TargetId::GrammarC,
        TargetId::GrammarCalculator,
        TargetId::GrammarCalculatorAst,
        TargetId::GrammarFexl,
        TargetId::GrammarJava,
        TargetId::GrammarLongTest,
        TargetId::All,
        TargetId::Test,
        TargetId::Bench,
    ];

    /// The command-line name of this target.
    pub fn name(&self) -> &'static str {
        match self {
            TargetId::Bootstrap => "bootstrap",
            TargetId::Peg0 => "peg0",
            TargetId::Peg1 => "peg1",
            TargetId::Peg2 => "peg2",
            TargetId::Peg3 => "peg3",
            TargetId::PegBootstrap => "peg-bootstrap",
            TargetId::PegPegGo => "peg.peg.go",
            TargetId::Peg => "peg",
            TargetId::GrammarC => "grammars/c",
            TargetId::GrammarCalculator => "grammars/calculator",
            TargetId::GrammarCalculatorAst => "grammars/calculator_ast",
            TargetId::GrammarFexl => "grammars/fexl",
            TargetId::GrammarJava => "grammars/java",
            TargetId::GrammarLongTest => "grammars/long_test",
            TargetId::All => "all",
            TargetId::Test => "test",
            TargetId::Bench => "bench",
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetId::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| format!("unknown target `{}`", s))
    }
}

/// One step of a target's action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run an external process.
    Exec(Invocation),
    /// Delete every file in the current directory ending with the suffix.
    RemoveSuffix(String),
}

/// The work a target performs when it is stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Action {
    /// Directory the steps run in, relative to the project root.
    pub dir: Option<PathBuf>,
    pub steps: Vec<Step>,
}

impl Action {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// When a target runs its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    /// Run only when the output or a dependency is stale.
    #[default]
    WhenStale,
    /// Run on every evaluation, after dependencies are resolved.
    Always,
}

/// A build target with its dependencies and action.
#[derive(Debug, Clone)]
pub struct Target {
    id: TargetId,

    /// Output artifact, relative to the project root. `None` for
    /// aggregate targets with no single output.
    output: Option<PathBuf>,

    /// Dependencies, checked in declaration order
    deps: Vec<Dependency>,

    action: Action,

    policy: RunPolicy,

    /// Whether `clean` deletes the output
    disposable: bool,
}

impl Target {
    /// Create a target that produces `output`.
    pub fn new(id: TargetId, output: impl Into<PathBuf>) -> Self {
        Target {
            id,
            output: Some(output.into()),
            deps: Vec::new(),
            action: Action::default(),
            policy: RunPolicy::WhenStale,
            disposable: false,
        }
    }

    /// Create an aggregate target with no output of its own.
    pub fn aggregate(id: TargetId) -> Self {
        Target {
            id,
            output: None,
            deps: Vec::new(),
            action: Action::default(),
            policy: RunPolicy::WhenStale,
            disposable: false,
        }
    }

    /// Add a file dependency.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.deps.push(Dependency::file(path));
        self
    }

    /// Add a dependency on another target.
    pub fn after(mut self, id: TargetId) -> Self {
        self.deps.push(Dependency::target(id));
        self
    }

    /// Run the action's steps inside `dir`.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.action.dir = Some(dir.into());
        self
    }

    /// Append a process invocation to the action.
    pub fn exec(mut self, invocation: Invocation) -> Self {
        self.action.steps.push(Step::Exec(invocation));
        self
    }

    /// Append a suffix sweep to the action.
    pub fn remove_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.action.steps.push(Step::RemoveSuffix(suffix.into()));
        self
    }

    /// Run the action on every evaluation.
    pub fn always_run(mut self) -> Self {
        self.policy = RunPolicy::Always;
        self
    }

    /// Mark the output as removable by `clean`.
    pub fn disposable(mut self) -> Self {
        self.disposable = true;
        self
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn deps(&self) -> &[Dependency] {
        &self.deps
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn policy(&self) -> RunPolicy {
        self.policy
    }

    pub fn is_disposable(&self) -> bool {
        self.disposable
    }
}
