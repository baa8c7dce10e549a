//! `bootstage run` command

use anyhow::Result;

use crate::cli::{GlobalArgs, RunArgs};
use bootstage::ops::{Request, DEFAULT_TARGET};

pub fn execute(global: &GlobalArgs, args: RunArgs) -> Result<()> {
    let name = args.target.as_deref().unwrap_or(DEFAULT_TARGET);
    let request: Request = name.parse()?;
    super::dispatch(global, request)
}
