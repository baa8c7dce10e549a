//! Staleness evaluation.
//!
//! A target is up to date iff its output exists, no file dependency is
//! newer than the output, and every referenced target was itself up to
//! date. Every dependency is visited even once the target is known to be
//! stale, so each reachable target is evaluated and cached exactly once per
//! run.

use std::time::SystemTime;

use tracing::{debug, info};

use crate::builder::action::run_action;
use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::core::dependency::Dependency;
use crate::core::target::{RunPolicy, TargetId};
use crate::core::target_set::TargetSet;
use crate::util::fs::mtime;

impl BuildContext {
    /// Evaluate `id`, running its action if it is stale.
    ///
    /// Returns `true` if the target was already up to date and nothing ran.
    /// A target already evaluated in this run is not evaluated again; its
    /// cached result is returned.
    pub fn evaluate(&mut self, targets: &TargetSet, id: TargetId) -> Result<bool, BuildError> {
        if let Some(fresh) = self.cache().get(id) {
            info!("{} is done", id);
            self.shell().target(id.name(), fresh, true);
            return Ok(fresh);
        }

        if let Some(pos) = self.in_progress_mut().iter().position(|t| *t == id) {
            let mut path = self.in_progress_mut()[pos..].to_vec();
            path.push(id);
            return Err(BuildError::Cycle { path });
        }

        self.in_progress_mut().push(id);
        let result = evaluate_uncached(self, targets, id);
        self.in_progress_mut().pop();

        let fresh = result?;
        self.cache_mut().insert(id, fresh);
        Ok(fresh)
    }
}

fn evaluate_uncached(
    cx: &mut BuildContext,
    targets: &TargetSet,
    id: TargetId,
) -> Result<bool, BuildError> {
    let target = targets.get(id)?;
    let mut fresh = true;

    let output_time: Option<SystemTime> = match target.output() {
        Some(output) => match mtime(&cx.project_path(output)) {
            Ok(time) => Some(time),
            Err(_) => {
                debug!("{}: output {} is missing", id, output.display());
                fresh = false;
                None
            }
        },
        None => None,
    };

    for dep in target.deps() {
        match dep {
            Dependency::File(path) => {
                let dep_time = mtime(&cx.project_path(path)).map_err(|source| {
                    BuildError::MissingDependency {
                        path: path.clone(),
                        source,
                    }
                })?;

                if let Some(output_time) = output_time {
                    if dep_time > output_time {
                        debug!("{}: {} is newer than its output", id, path.display());
                        fresh = false;
                    }
                }
            }
            Dependency::Target(upstream) => {
                let upstream_fresh = cx.evaluate(targets, *upstream)?;
                if !upstream_fresh {
                    debug!("{}: upstream {} was rebuilt", id, upstream);
                }
                fresh = fresh && upstream_fresh;
            }
        }
    }

    if fresh && target.policy() == RunPolicy::WhenStale {
        info!("{}", id);
        cx.shell().target(id.name(), true, false);
        return Ok(true);
    }

    run_action(cx, target)?;
    info!("{}", id);
    cx.shell().target(id.name(), false, false);
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::Target;
    use crate::test_support::{at, set_mtime, write_file, CommandLog, RecordingRunner};
    use crate::util::process::Invocation;
    use std::path::Path;
    use tempfile::TempDir;

    fn context(root: &Path, runner: RecordingRunner) -> (BuildContext, CommandLog) {
        let log = runner.log();
        (BuildContext::new(root, Box::new(runner)), log)
    }

    /// A -> B -> C chain: peg0 depends on a.src, peg1 on peg0, peg2 on peg1.
    fn chain() -> TargetSet {
        TargetSet::new()
            .with(
                Target::new(TargetId::Peg0, "a.out")
                    .file("a.src")
                    .exec(Invocation::new("gen").arg("a").stdout_to("a.out")),
            )
            .unwrap()
            .with(
                Target::new(TargetId::Peg1, "b.out")
                    .after(TargetId::Peg0)
                    .exec(Invocation::new("gen").arg("b").stdout_to("b.out")),
            )
            .unwrap()
            .with(
                Target::new(TargetId::Peg2, "c.out")
                    .after(TargetId::Peg1)
                    .exec(Invocation::new("gen").arg("c").stdout_to("c.out")),
            )
            .unwrap()
    }

    fn fresh_chain(root: &Path) {
        let src = write_file(root, "a.src", "a");
        set_mtime(&src, at(0));
        for (i, out) in ["a.out", "b.out", "c.out"].iter().enumerate() {
            let path = write_file(root, out, "");
            set_mtime(&path, at(10 + i as u64));
        }
    }

    #[test]
    fn test_missing_output_runs_action() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.src", "a");
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());

        let set = chain();
        assert!(!cx.evaluate(&set, TargetId::Peg0).unwrap());
        assert_eq!(log.commands(), vec!["gen a > a.out"]);
        assert!(tmp.path().join("a.out").exists());
    }

    #[test]
    fn test_up_to_date_chain_runs_nothing() {
        let tmp = TempDir::new().unwrap();
        fresh_chain(tmp.path());
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());

        assert!(cx.evaluate(&chain(), TargetId::Peg2).unwrap());
        assert!(log.is_empty());
        assert_eq!(cx.invocations(), 0);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let src = write_file(tmp.path(), "a.src", "a");
        set_mtime(&src, at(0));
        let set = chain();

        let (mut first, log) = context(tmp.path(), RecordingRunner::new());
        assert!(!first.evaluate(&set, TargetId::Peg2).unwrap());
        assert_eq!(log.len(), 3);

        let (mut second, log) = context(tmp.path(), RecordingRunner::new());
        assert!(second.evaluate(&set, TargetId::Peg2).unwrap());
        assert!(log.is_empty());
    }

    #[test]
    fn test_touching_leaf_propagates_through_chain() {
        let tmp = TempDir::new().unwrap();
        fresh_chain(tmp.path());
        set_mtime(&tmp.path().join("a.src"), at(100));
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());

        assert!(!cx.evaluate(&chain(), TargetId::Peg2).unwrap());
        assert_eq!(
            log.commands(),
            vec!["gen a > a.out", "gen b > b.out", "gen c > c.out"]
        );
        assert_eq!(cx.cache().get(TargetId::Peg0), Some(false));
        assert_eq!(cx.cache().get(TargetId::Peg1), Some(false));
        assert_eq!(cx.cache().get(TargetId::Peg2), Some(false));
    }

    #[test]
    fn test_any_newer_file_forces_rebuild() {
        let tmp = TempDir::new().unwrap();
        for (name, secs) in [("x.peg", 0), ("y.peg", 50), ("z.peg", 0)] {
            let p = write_file(tmp.path(), name, "");
            set_mtime(&p, at(secs));
        }
        let out = write_file(tmp.path(), "gen.out", "");
        set_mtime(&out, at(10));

        let set = TargetSet::new()
            .with(
                Target::new(TargetId::Peg, "gen.out")
                    .file("x.peg")
                    .file("y.peg")
                    .file("z.peg")
                    .exec(Invocation::new("gen")),
            )
            .unwrap();
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());

        assert!(!cx.evaluate(&set, TargetId::Peg).unwrap());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_equal_mtime_is_fresh() {
        let tmp = TempDir::new().unwrap();
        let src = write_file(tmp.path(), "spec.g", "");
        let out = write_file(tmp.path(), "gen.out", "");
        set_mtime(&src, at(5));
        set_mtime(&out, at(5));

        let set = TargetSet::new()
            .with(Target::new(TargetId::Peg, "gen.out").file("spec.g"))
            .unwrap();
        let (mut cx, _) = context(tmp.path(), RecordingRunner::new());

        assert!(cx.evaluate(&set, TargetId::Peg).unwrap());
    }

    #[test]
    fn test_newer_spec_runs_action_exactly_once() {
        let tmp = TempDir::new().unwrap();
        let out = write_file(tmp.path(), "gen.out", "");
        let spec = write_file(tmp.path(), "spec.g", "");
        set_mtime(&out, at(0));
        set_mtime(&spec, at(1));

        let set = TargetSet::new()
            .with(
                Target::new(TargetId::GrammarC, "gen.out")
                    .file("spec.g")
                    .exec(Invocation::new("gen").stdin_from("spec.g").stdout_to("gen.out")),
            )
            .unwrap();
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());

        assert!(!cx.evaluate(&set, TargetId::GrammarC).unwrap());
        assert!(!cx.evaluate(&set, TargetId::GrammarC).unwrap());
        assert_eq!(log.count_matching("gen"), 1);
    }

    #[test]
    fn test_shared_upstream_is_evaluated_once() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "peg.src", "");
        write_file(tmp.path(), "c.peg", "");
        write_file(tmp.path(), "fexl.peg", "");

        let set = TargetSet::new()
            .with(
                Target::new(TargetId::Peg, "peg")
                    .file("peg.src")
                    .exec(Invocation::new("go").arg("build")),
            )
            .unwrap()
            .with(
                Target::new(TargetId::GrammarC, "c.peg.go")
                    .after(TargetId::Peg)
                    .file("c.peg")
                    .exec(Invocation::new("./peg").arg("c.peg")),
            )
            .unwrap()
            .with(
                Target::new(TargetId::GrammarFexl, "fexl.peg.go")
                    .after(TargetId::Peg)
                    .file("fexl.peg")
                    .exec(Invocation::new("./peg").arg("fexl.peg")),
            )
            .unwrap()
            .with(
                Target::aggregate(TargetId::All)
                    .after(TargetId::GrammarC)
                    .after(TargetId::GrammarFexl),
            )
            .unwrap();
        let runner = RecordingRunner::new().produces("go build", "peg");
        let (mut cx, log) = context(tmp.path(), runner);

        assert!(!cx.evaluate(&set, TargetId::All).unwrap());
        assert_eq!(log.count_matching("go build"), 1);
        assert_eq!(log.count_matching("./peg"), 2);
    }

    #[test]
    fn test_missing_file_dependency_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let set = TargetSet::new()
            .with(
                Target::new(TargetId::Peg, "peg")
                    .file("main.go")
                    .exec(Invocation::new("go").arg("build")),
            )
            .unwrap();
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());

        let err = cx.evaluate(&set, TargetId::Peg).unwrap_err();
        assert!(matches!(err, BuildError::MissingDependency { .. }));
        assert!(log.is_empty());
        assert!(cx.cache().get(TargetId::Peg).is_none());
    }

    #[test]
    fn test_all_dependencies_visited_after_missing_output() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.src", "");
        let b = write_file(tmp.path(), "b.out", "");
        set_mtime(&b, at(0));
        let b_src = write_file(tmp.path(), "b.src", "");
        set_mtime(&b_src, at(0));

        // peg1's own output is missing, yet peg0 (fresh) must still be
        // evaluated and cached.
        let set = TargetSet::new()
            .with(Target::new(TargetId::Peg0, "b.out").file("b.src"))
            .unwrap()
            .with(
                Target::new(TargetId::Peg1, "missing.out")
                    .file("a.src")
                    .after(TargetId::Peg0)
                    .exec(Invocation::new("gen")),
            )
            .unwrap();
        let (mut cx, _) = context(tmp.path(), RecordingRunner::new());

        assert!(!cx.evaluate(&set, TargetId::Peg1).unwrap());
        assert_eq!(cx.cache().get(TargetId::Peg0), Some(true));
    }

    #[test]
    fn test_aggregate_with_fresh_deps_skips_action() {
        let tmp = TempDir::new().unwrap();
        let src = write_file(tmp.path(), "c.peg", "");
        set_mtime(&src, at(0));
        let out = write_file(tmp.path(), "c.peg.go", "");
        set_mtime(&out, at(1));

        let set = TargetSet::new()
            .with(Target::new(TargetId::GrammarC, "c.peg.go").file("c.peg"))
            .unwrap()
            .with(
                Target::aggregate(TargetId::Test)
                    .after(TargetId::GrammarC)
                    .exec(Invocation::new("go").arg("test")),
            )
            .unwrap();
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());

        assert!(cx.evaluate(&set, TargetId::Test).unwrap());
        assert!(log.is_empty());

        set_mtime(&src, at(2));
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());
        assert!(!cx.evaluate(&set, TargetId::Test).unwrap());
        assert_eq!(log.commands(), vec!["go test"]);
    }

    #[test]
    fn test_always_run_policy() {
        let tmp = TempDir::new().unwrap();
        let set = TargetSet::new()
            .with(
                Target::aggregate(TargetId::Bench)
                    .always_run()
                    .exec(Invocation::new("go").args(["test", "-bench", "."])),
            )
            .unwrap();
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());

        assert!(!cx.evaluate(&set, TargetId::Bench).unwrap());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_failure_stops_downstream_actions() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.src", "");
        let runner = RecordingRunner::new().fails_on("gen a");
        let (mut cx, log) = context(tmp.path(), runner);

        let err = cx.evaluate(&chain(), TargetId::Peg2).unwrap_err();
        assert!(matches!(err, BuildError::CommandFailed { code: Some(1), .. }));
        assert_eq!(log.commands(), vec!["gen a > a.out"]);
        assert!(cx.cache().is_empty());
    }

    #[test]
    fn test_failure_aborts_before_later_steps_of_same_target() {
        let tmp = TempDir::new().unwrap();
        let set = TargetSet::new()
            .with(
                Target::new(TargetId::Peg1, "peg1")
                    .exec(Invocation::new("./peg0").stdout_to("peg1.peg.go"))
                    .exec(Invocation::new("go").args(["build", "-o", "peg1"])),
            )
            .unwrap();
        let runner = RecordingRunner::new().fails_on("./peg0");
        let (mut cx, log) = context(tmp.path(), runner);

        assert!(cx.evaluate(&set, TargetId::Peg1).is_err());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_cycle_detected() {
        let tmp = TempDir::new().unwrap();
        let set = TargetSet::new()
            .with(Target::new(TargetId::Peg0, "a").after(TargetId::Peg1))
            .unwrap()
            .with(Target::new(TargetId::Peg1, "b").after(TargetId::Peg0))
            .unwrap();
        let (mut cx, _) = context(tmp.path(), RecordingRunner::new());

        let err = cx.evaluate(&set, TargetId::Peg0).unwrap_err();
        match err {
            BuildError::Cycle { path } => {
                assert_eq!(path, vec![TargetId::Peg0, TargetId::Peg1, TargetId::Peg0]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_undefined_reference() {
        let tmp = TempDir::new().unwrap();
        let set = TargetSet::new()
            .with(Target::new(TargetId::Peg0, "a").after(TargetId::Bootstrap))
            .unwrap();
        let (mut cx, _) = context(tmp.path(), RecordingRunner::new());

        assert!(matches!(
            cx.evaluate(&set, TargetId::Peg0),
            Err(BuildError::UndefinedTarget {
                id: TargetId::Bootstrap
            })
        ));
    }

    #[test]
    fn test_reset_cache_allows_reevaluation() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.src", "");
        let set = TargetSet::new()
            .with(
                Target::new(TargetId::Peg0, "never-produced")
                    .file("a.src")
                    .exec(Invocation::new("gen")),
            )
            .unwrap();
        let (mut cx, log) = context(tmp.path(), RecordingRunner::new());

        cx.evaluate(&set, TargetId::Peg0).unwrap();
        cx.evaluate(&set, TargetId::Peg0).unwrap();
        assert_eq!(log.len(), 1);

        cx.reset_cache();
        cx.evaluate(&set, TargetId::Peg0).unwrap();
        assert_eq!(log.len(), 2);
    }
}
