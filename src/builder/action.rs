//! Execution of target actions.

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::core::target::{Step, Target};
use crate::util::fs::remove_files_with_suffix;

/// Run `target`'s action, inside its directory if it declares one.
///
/// The first failing step aborts the action; later steps never run.
pub fn run_action(cx: &mut BuildContext, target: &Target) -> Result<(), BuildError> {
    let action = target.action();
    match &action.dir {
        Some(dir) => {
            let mut guard = cx.enter_dir(dir)?;
            run_steps(&mut guard, &action.steps)
        }
        None => run_steps(cx, &action.steps),
    }
}

fn run_steps(cx: &mut BuildContext, steps: &[Step]) -> Result<(), BuildError> {
    for step in steps {
        match step {
            Step::Exec(invocation) => cx.run(invocation)?,
            Step::RemoveSuffix(suffix) => {
                let dir = cx.current_dir().to_path_buf();
                remove_files_with_suffix(&dir, suffix)?;
            }
        }
    }
    Ok(())
}
