//! `clean`: remove the output root.

use std::fs;
use std::io::ErrorKind;

use super::{TaskContext, TaskError, TaskOutcome, TaskResult};

pub fn run(ctx: &TaskContext) -> TaskResult {
    let output = ctx.table.output();
    match fs::remove_dir_all(output) {
        Ok(()) => {
            crate::debug!("clean"; "removed {}", ctx.display(output));
            Ok(TaskOutcome::Succeeded { written: 0 })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(TaskOutcome::Succeeded { written: 0 }),
        Err(e) => Err(TaskError::fs(output, e)),
    }
}
