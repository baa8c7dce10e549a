//! `bootstage list` command

use anyhow::Result;
use serde::Serialize;

use crate::cli::GlobalArgs;
use bootstage::core::Dependency;

use super::Session;

#[derive(Serialize)]
struct TargetDefinition<'a> {
    reason: &'static str,
    target: &'a str,
    output: Option<String>,
    deps: Vec<String>,
}

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let session = Session::open(global)?;

    for target in session.targets.iter() {
        if session.shell.is_json() {
            session.shell.json_event(&TargetDefinition {
                reason: "target-definition",
                target: target.name(),
                output: target.output().map(|p| p.display().to_string()),
                deps: target.deps().iter().map(Dependency::to_string).collect(),
            });
            continue;
        }

        let output = target
            .output()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {}", target.name(), output);
    }

    Ok(())
}
