//! `minify-html`: cache-bust asset references and collapse whitespace.

mod minify;
mod version;

pub use minify::collapse_whitespace;
pub use version::{VersionManifest, Versioner};

use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;

use super::{TaskContext, TaskError, TaskId, TaskOutcome, TaskResult};
use crate::paths::{AssetKind, SourceFile};

/// A processed page waiting to be written.
struct Page<'a> {
    file: &'a SourceFile,
    html: Vec<u8>,
    rewrites: Vec<(String, String)>,
}

pub fn run(ctx: &TaskContext) -> TaskResult {
    let files = ctx.inputs(TaskId::MinifyHtml, AssetKind::Markup);
    let token = ctx.config.version_token();
    let markup = &ctx.config.markup;
    let versioner = token
        .as_deref()
        .map(|t| Versioner::new(t, &markup.version.key));

    let pages = files
        .par_iter()
        .map(|file| {
            let source = fs::read_to_string(&file.path).map_err(|e| TaskError::fs(&file.path, e))?;
            let (html, rewrites) = match &versioner {
                Some(v) => v.rewrite(&source),
                None => (source, Vec::new()),
            };
            let html = if markup.minify {
                collapse_whitespace(&html)
            } else {
                html.into_bytes()
            };
            Ok(Page {
                file,
                html,
                rewrites,
            })
        })
        .collect::<Result<Vec<_>, TaskError>>()?;

    let mut written = 0;
    let mut manifest = token.as_deref().map(VersionManifest::new);
    for page in pages {
        ctx.write_output(&page.file.dest, &page.html)?;
        written += 1;
        if let Some(manifest) = &mut manifest {
            manifest.extend(page.rewrites);
        }
    }

    if let Some(manifest) = manifest
        && written > 0
    {
        let path = manifest_path(ctx);
        let json = manifest
            .to_json()
            .map_err(|e| TaskError::tooling(&path, e))?;
        ctx.write_output(&path, json.as_bytes())?;
        written += 1;
    }

    Ok(TaskOutcome::Succeeded { written })
}

/// Where `version.json` lands, relative to the output root.
pub(super) fn manifest_path(ctx: &TaskContext) -> PathBuf {
    ctx.table.output().join(&ctx.config.markup.version.manifest)
}
