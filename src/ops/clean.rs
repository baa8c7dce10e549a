//! Implementation of `bootstage clean`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::core::target_set::TargetSet;
use crate::ops::bootstrap::{GENERATED_SUFFIX, STAGE_DIR};
use crate::util::fs::{remove_file_if_exists, remove_files_with_suffix};
use crate::util::shell::Status;

/// Files removed by a clean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Removed paths, relative to the project root
    pub removed: Vec<PathBuf>,
}

/// Delete every disposable output and the staged generated sources.
///
/// Staleness is never consulted and missing files are not an error. The
/// evaluation cache is reset afterwards, so a later evaluation in the same
/// run rebuilds from scratch.
pub fn clean(cx: &mut BuildContext, targets: &TargetSet) -> Result<CleanReport, BuildError> {
    let mut report = CleanReport::default();

    for target in targets.iter().filter(|t| t.is_disposable()) {
        let Some(output) = target.output() else {
            continue;
        };
        if remove_file_if_exists(&cx.project_path(output))? {
            info!("rm -f {}", output.display());
            report.removed.push(output.to_path_buf());
        }
    }

    let stage_dir = cx.project_path(Path::new(STAGE_DIR));
    for path in remove_files_with_suffix(&stage_dir, GENERATED_SUFFIX)? {
        let rel = path.strip_prefix(cx.root()).unwrap_or(&path).to_path_buf();
        report.removed.push(rel);
    }

    cx.reset_cache();

    for path in &report.removed {
        cx.shell().status(Status::Removed, path.display());
    }
    Ok(report)
}
