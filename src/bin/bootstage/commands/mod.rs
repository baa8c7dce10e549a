//! Command implementations

pub mod buildinfo;
pub mod clean;
pub mod list;
pub mod run;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::{GlobalArgs, MessageFormat};
use bootstage::ops::{self, Outcome, Request};
use bootstage::util::shell::{Shell, Status};
use bootstage::util::{Config, GlobalContext};
use bootstage::{BuildContext, TargetSet};

/// Everything one invocation of the binary works with.
pub struct Session {
    pub gctx: GlobalContext,
    pub config: Config,
    pub targets: TargetSet,
    pub shell: Arc<Shell>,
}

impl Session {
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let mut gctx = match &global.project_dir {
            Some(dir) => GlobalContext::with_root(dir)?,
            None => GlobalContext::new()?,
        };
        gctx.set_verbose(global.verbose);

        // CLI overrides config
        let config = gctx
            .load_config()?
            .with_go(global.go.clone())
            .rooted_at(gctx.root());
        let targets = ops::targets(&config)?;

        let shell = Arc::new(Shell::from_flags(
            global.quiet,
            gctx.is_verbose(),
            global.color,
            global.message_format == MessageFormat::Json,
        ));

        Ok(Session {
            gctx,
            config,
            targets,
            shell,
        })
    }

    /// A fresh build context for this project.
    pub fn build_context(&self) -> BuildContext {
        BuildContext::with_processes(self.gctx.root()).with_shell(Arc::clone(&self.shell))
    }
}

/// Run one request and report its outcome.
pub fn dispatch(global: &GlobalArgs, request: Request) -> Result<()> {
    let session = Session::open(global)?;
    tracing::debug!("go toolchain: {}", session.config.toolchain.go.display());

    let mut cx = session.build_context();
    let span = session.shell.span(Status::Running, request);

    match ops::run(&mut cx, &session.targets, request)? {
        Outcome::Built { target, fresh } => {
            let state = if fresh { "up to date" } else { "rebuilt" };
            span.finish_with_message(format!("`{}` {}", target, state));
        }
        Outcome::Cleaned(report) => {
            span.finish_with_message(format!("clean, {} files removed", report.removed.len()));
        }
        Outcome::BuildInfo { info, path } => {
            session.shell.status(Status::Generated, path.display());
            span.finish_with_message(format!("buildinfo {}", info.version));
        }
    }

    Ok(())
}
