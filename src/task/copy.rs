//! `copy-fonts`: copy font files verbatim.

use std::fs;

use rayon::prelude::*;

use super::{TaskContext, TaskError, TaskId, TaskOutcome, TaskResult};
use crate::paths::{AssetKind, SourceFile};

pub fn run(ctx: &TaskContext) -> TaskResult {
    let files = ctx.inputs(TaskId::CopyFonts, AssetKind::Font);

    let results: Vec<_> = files.par_iter().map(|file| copy_one(ctx, file)).collect();
    let outcome = TaskOutcome::from_results(results);

    if let TaskOutcome::Degraded { failures, .. } = &outcome {
        for failure in failures {
            crate::log!("error"; "copy-fonts: {}", failure);
        }
    }
    Ok(outcome)
}

fn copy_one(ctx: &TaskContext, file: &SourceFile) -> Result<usize, TaskError> {
    if let Some(parent) = file.dest.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::fs(parent, e))?;
    }
    fs::copy(&file.path, &file.dest).map_err(|e| TaskError::fs(&file.path, e))?;
    ctx.reload.changed(&file.dest);
    Ok(1)
}
