//! `bootstage buildinfo` command

use anyhow::Result;

use crate::cli::GlobalArgs;
use bootstage::ops::Request;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    super::dispatch(global, Request::BuildInfo)
}
