//! Run dispatcher: maps a requested name to a target chain or to one of the
//! maintenance operations that stay outside staleness evaluation.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::core::target::TargetId;
use crate::core::target_set::TargetSet;
use crate::ops::buildinfo::{buildinfo, BuildInfo};
use crate::ops::clean::{clean, CleanReport};

/// Target built when none is named.
pub const DEFAULT_TARGET: &str = "peg";

/// What a run was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Build(TargetId),
    Clean,
    BuildInfo,
}

impl FromStr for Request {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clean" => Ok(Request::Clean),
            "buildinfo" => Ok(Request::BuildInfo),
            name => name
                .parse::<TargetId>()
                .map(Request::Build)
                .map_err(|_| BuildError::UnknownTarget {
                    name: name.to_string(),
                }),
        }
    }
}

impl Default for Request {
    fn default() -> Self {
        Request::Build(TargetId::Peg)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Build(id) => write!(f, "{}", id),
            Request::Clean => f.write_str("clean"),
            Request::BuildInfo => f.write_str("buildinfo"),
        }
    }
}

/// Result of a dispatched run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Built { target: TargetId, fresh: bool },
    Cleaned(CleanReport),
    BuildInfo { info: BuildInfo, path: PathBuf },
}

/// Execute `request` against `targets`.
pub fn run(
    cx: &mut BuildContext,
    targets: &TargetSet,
    request: Request,
) -> Result<Outcome, BuildError> {
    debug!("dispatching {}", request);
    match request {
        Request::Build(target) => {
            let fresh = cx.evaluate(targets, target)?;
            Ok(Outcome::Built { target, fresh })
        }
        Request::Clean => clean(cx, targets).map(Outcome::Cleaned),
        Request::BuildInfo => {
            let (info, path) = buildinfo(cx.root())?;
            Ok(Outcome::BuildInfo { info, path })
        }
    }
}
