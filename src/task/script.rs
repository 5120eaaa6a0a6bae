//! `minify-scripts`: parse, compress, mangle and print each script entry.

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use rayon::prelude::*;

use super::error::line_col;
use super::{TaskContext, TaskError, TaskId, TaskOutcome, TaskResult};
use crate::paths::AssetKind;

pub fn run(ctx: &TaskContext) -> TaskResult {
    let files = ctx.inputs(TaskId::MinifyScripts, AssetKind::Script);

    let minified = files
        .par_iter()
        .map(|file| {
            let source =
                std::fs::read_to_string(&file.path).map_err(|e| TaskError::fs(&file.path, e))?;
            minify_js(&source, &file.path).map(|code| (&file.dest, code))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (dest, code) in &minified {
        ctx.write_output(dest, code.as_bytes())?;
    }
    Ok(TaskOutcome::Succeeded {
        written: minified.len(),
    })
}

/// Minify JavaScript source code.
///
/// The first parse error is reported with its line and column.
pub fn minify_js(source: &str, path: &Path) -> Result<String, TaskError> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs());
    let ret = Parser::new(&allocator, source, source_type).parse();

    if let Some(diag) = ret.errors.first() {
        let offset = diag
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| label.offset());
        let (line, column) = offset.map(|o| line_col(source, o)).unzip();
        return Err(TaskError::Syntax {
            path: path.to_path_buf(),
            line,
            column,
            message: diag.message.to_string(),
        });
    }
    if ret.panicked {
        return Err(TaskError::Syntax {
            path: path.to_path_buf(),
            line: None,
            column: None,
            message: "parser gave up".into(),
        });
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}
