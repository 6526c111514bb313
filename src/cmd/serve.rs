/*!
serve.rs - run the MCP server over stdio.

Builds an Invoker from the resolved kubeconfig override and hands it to the
stdio transport. Blocks until the client closes the session.
*/

use crate::kubectl::{CATALOG, Invoker};
use crate::log_info;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ServeArgs {}

pub fn execute_serve(_args: ServeArgs, kubeconfig: Option<PathBuf>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    let invoker = Arc::new(Invoker::new(kubeconfig));

    log_info!("serving {} operations over stdio", CATALOG.len());
    rt.block_on(crate::mcp::serve_stdio(invoker))
}
