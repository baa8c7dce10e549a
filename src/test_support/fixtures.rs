//! Test fixtures for the generator bootstrap chain.
//!
//! [`create_peg_project`] lays out the hand-written sources the chain
//! starts from. [`peg_runner`] pretends to be the Go toolchain and the
//! staged generators: each command creates the artifact the real one would.

use std::path::Path;

use super::{at, set_mtime, write_file, RecordingRunner};

/// Hand-written sources, relative to the project root.
pub const PEG_SOURCES: &[&str] = &[
    "bootstrap/main.go",
    "tree/peg.go",
    "cmd/peg-bootstrap/main.go",
    "cmd/peg-bootstrap/bootstrap.peg",
    "cmd/peg-bootstrap/peg.bootstrap.peg",
    "peg.peg",
    "main.go",
    "grammars/c/c.peg",
    "grammars/calculator/calculator.peg",
    "grammars/calculator_ast/calculator.peg",
    "grammars/fexl/fexl.peg",
    "grammars/java/java_1_7.peg",
    "grammars/long_test/long.peg",
];

/// Write every hand-written source under `root`, all dated [`at(0)`](at).
pub fn create_peg_project(root: &Path) {
    for rel in PEG_SOURCES {
        let path = write_file(root, rel, &format!("// {}\n", rel));
        set_mtime(&path, at(0));
    }
}

/// A runner that produces each chain artifact when its command runs.
pub fn peg_runner(root: &Path) -> RecordingRunner {
    let stage_dir = root.join("cmd/peg-bootstrap");
    let mut runner = RecordingRunner::new()
        .produces_in(root.join("bootstrap"), "go build", "bootstrap")
        .produces_in(root, "go build", "peg");

    for stage in ["peg0", "peg1", "peg2", "peg3", "peg-bootstrap"] {
        runner = runner.produces_in(&stage_dir, format!("-o {}", stage), stage);
    }

    for (dir, file) in [
        ("c", "c.peg"),
        ("calculator", "calculator.peg"),
        ("calculator_ast", "calculator.peg"),
        ("fexl", "fexl.peg"),
        ("java", "java_1_7.peg"),
        ("long_test", "long.peg"),
    ] {
        runner = runner.produces_in(
            root.join("grammars").join(dir),
            format!("../../peg -switch -inline {}", file),
            format!("{}.go", file),
        );
    }

    runner
}
