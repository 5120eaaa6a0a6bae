//! `sitepack dev`: build once, then serve and watch.
//!
//! A failed clean is fatal (the output root is in an unknown state).
//! Other task failures are reported and shown in connected browsers until
//! a watch-triggered run of the task succeeds.

use std::sync::Arc;

use anyhow::{Result, bail};

use super::{build, serve};
use crate::{
    config::PackConfig,
    graph::NodeState,
    log,
    reload::ReloadHandle,
    task::TaskId,
};

pub fn dev(config: Arc<PackConfig>) -> Result<()> {
    let ctx = build::prepare(config, ReloadHandle::disabled())?;

    let report = build::run_graph(&ctx)?;
    build::print_report(&report);
    if report.state(TaskId::Clean) == Some(NodeState::Failed) {
        bail!("cannot serve: cleaning the output directory failed");
    }
    let failed = build::failures(&report);

    let server = serve::bind_server()?;
    crate::core::set_serving();
    if ctx.config.serve.watch {
        log!("watch"; "watching {}", ctx.display(ctx.table.source()));
    }

    crate::debug!("serve"; "listening on {}", server.addr());
    server.run(ctx, failed)
}
