//! The bootstrap chain.
//!
//! Each generation of the generator is produced by running the previous
//! generation over a grammar, then compiling the emitted source:
//!
//! ```text
//! bootstrap -> peg0 -> peg1 -> peg2 -> peg3 -> peg-bootstrap -> peg.peg.go -> peg
//!                                                                              |
//!                                                        grammars/* <----------+
//! ```
//!
//! All paths are relative to the project root.

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::core::target::{Target, TargetId};
use crate::core::target_set::TargetSet;
use crate::util::config::Config;
use crate::util::process::Invocation;

/// Where the staged generators are built.
pub const STAGE_DIR: &str = "cmd/peg-bootstrap";

/// Suffix of every generated source file.
pub const GENERATED_SUFFIX: &str = ".peg.go";

/// A downstream grammar regenerated by the production binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    pub id: TargetId,
    /// Directory holding the grammar, relative to the project root
    pub dir: &'static str,
    /// Grammar file name inside `dir`
    pub file: &'static str,
}

impl Grammar {
    /// The grammar file, relative to the project root.
    pub fn source(&self) -> PathBuf {
        Path::new(self.dir).join(self.file)
    }

    /// The generated source, relative to the project root.
    pub fn output(&self) -> PathBuf {
        Path::new(self.dir).join(format!("{}.go", self.file))
    }
}

/// Every downstream grammar.
pub const GRAMMARS: [Grammar; 6] = [
    Grammar {
        id: TargetId::GrammarC,
        dir: "grammars/c",
        file: "c.peg",
    },
    Grammar {
        id: TargetId::GrammarCalculator,
        dir: "grammars/calculator",
        file: "calculator.peg",
    },
    Grammar {
        id: TargetId::GrammarCalculatorAst,
        dir: "grammars/calculator_ast",
        file: "calculator.peg",
    },
    Grammar {
        id: TargetId::GrammarFexl,
        dir: "grammars/fexl",
        file: "fexl.peg",
    },
    Grammar {
        id: TargetId::GrammarJava,
        dir: "grammars/java",
        file: "java_1_7.peg",
    },
    Grammar {
        id: TargetId::GrammarLongTest,
        dir: "grammars/long_test",
        file: "long.peg",
    },
];

/// A staged generator: `prev < grammar > <name>.peg.go`, then compile.
struct Stage {
    id: TargetId,
    prev: TargetId,
    /// Binary of the previous stage, relative to the stage dir
    generator: &'static str,
    /// Grammar fed to the previous stage, relative to the stage dir
    grammar: &'static str,
    /// Grammar as a file dependency, relative to the project root. `None`
    /// when the stage only depends on the previous generation.
    dependency: Option<&'static str>,
}

const STAGES: [Stage; 4] = [
    Stage {
        id: TargetId::Peg1,
        prev: TargetId::Peg0,
        generator: "./peg0",
        grammar: "bootstrap.peg",
        dependency: Some("cmd/peg-bootstrap/bootstrap.peg"),
    },
    Stage {
        id: TargetId::Peg2,
        prev: TargetId::Peg1,
        generator: "./peg1",
        grammar: "peg.bootstrap.peg",
        dependency: Some("cmd/peg-bootstrap/peg.bootstrap.peg"),
    },
    Stage {
        id: TargetId::Peg3,
        prev: TargetId::Peg2,
        generator: "./peg2",
        grammar: "../../peg.peg",
        dependency: Some("peg.peg"),
    },
    Stage {
        id: TargetId::PegBootstrap,
        prev: TargetId::Peg3,
        generator: "./peg3",
        grammar: "../../peg.peg",
        dependency: None,
    },
];

/// Build the full target set for a project.
pub fn targets(config: &Config) -> Result<TargetSet, BuildError> {
    let go = config.toolchain.go.as_path();
    let go_build = |name: &str| {
        Invocation::new(go).args(["build", "-tags", "bootstrap", "-o", name])
    };

    let mut set = TargetSet::new();

    set.insert(
        Target::new(TargetId::Bootstrap, "bootstrap/bootstrap")
            .file("bootstrap/main.go")
            .file("tree/peg.go")
            .in_dir("bootstrap")
            .exec(Invocation::new(go).arg("build"))
            .disposable(),
    )?;

    set.insert(
        Target::new(TargetId::Peg0, stage_path("peg0"))
            .file(stage_path("main.go"))
            .after(TargetId::Bootstrap)
            .in_dir(STAGE_DIR)
            .remove_suffix(GENERATED_SUFFIX)
            .exec(Invocation::new("../../bootstrap/bootstrap"))
            .exec(go_build("peg0"))
            .disposable(),
    )?;

    for stage in &STAGES {
        let name = stage.id.name();
        let mut target = Target::new(stage.id, stage_path(name)).after(stage.prev);
        if let Some(dep) = stage.dependency {
            target = target.file(dep);
        }
        set.insert(
            target
                .in_dir(STAGE_DIR)
                .remove_suffix(GENERATED_SUFFIX)
                .exec(
                    Invocation::new(stage.generator)
                        .stdin_from(stage.grammar)
                        .stdout_to(format!("{}{}", name, GENERATED_SUFFIX)),
                )
                .exec(go_build(name))
                .disposable(),
        )?;
    }

    set.insert(
        Target::new(TargetId::PegPegGo, "peg.peg.go")
            .after(TargetId::PegBootstrap)
            .exec(
                Invocation::new(stage_path("peg-bootstrap"))
                    .stdin_from("peg.peg")
                    .stdout_to("peg.peg.go"),
            )
            .exec(Invocation::new(go).arg("build"))
            .exec(Invocation::new("./peg").args(["-inline", "-switch", "peg.peg"])),
    )?;

    set.insert(
        Target::new(TargetId::Peg, "peg")
            .after(TargetId::PegPegGo)
            .file("main.go")
            .exec(Invocation::new(go).arg("build")),
    )?;

    for grammar in &GRAMMARS {
        set.insert(
            Target::new(grammar.id, grammar.output())
                .after(TargetId::Peg)
                .file(grammar.source())
                .in_dir(grammar.dir)
                .exec(
                    Invocation::new("../../peg")
                        .args(&config.generator.flags)
                        .arg(grammar.file),
                )
                .disposable(),
        )?;
    }

    let mut all = Target::aggregate(TargetId::All).after(TargetId::Peg);
    let mut test = Target::aggregate(TargetId::Test);
    for grammar in &GRAMMARS {
        all = all.after(grammar.id);
        test = test.after(grammar.id);
    }
    set.insert(all)?;
    set.insert(test.exec(Invocation::new(go).args(config.test_args())))?;

    set.insert(
        Target::aggregate(TargetId::Bench)
            .after(TargetId::Peg)
            .always_run()
            .exec(Invocation::new(go).args(config.bench_args())),
    )?;

    Ok(set)
}

fn stage_path(name: &str) -> PathBuf {
    Path::new(STAGE_DIR).join(name)
}
