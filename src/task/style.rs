//! `compile-styles`: SCSS → prefixed, minified CSS.
//!
//! ```text
//! sass/style.scss --grass--> css --lightningcss(prefix, minify)--> css/style.min.css
//! ```
//!
//! Every entry is compiled before anything is written, so a syntax error
//! leaves the previous output in place.
//!
//! With `[style] sourcemap`, each output gets a `.map` sibling whose
//! mappings point into the compiled (not yet minified) CSS of its entry.

use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::Targets;
use parcel_sourcemap::SourceMap;
use rayon::prelude::*;

use super::{TaskContext, TaskError, TaskId, TaskOutcome, TaskResult};
use crate::config::StyleConfig;
use crate::paths::{AssetKind, SourceFile};

pub fn run(ctx: &TaskContext) -> TaskResult {
    let files = ctx.inputs(TaskId::CompileStyles, AssetKind::Style);

    let compiled = files
        .par_iter()
        .map(|file| compile(ctx, file))
        .collect::<Result<Vec<_>, _>>()?;

    let mut written = 0;
    for out in &compiled {
        ctx.write_output(&out.dest, out.css.as_bytes())?;
        written += 1;
        if let Some(map) = &out.map {
            ctx.write_output(&map_path(&out.dest), map.as_bytes())?;
            written += 1;
        }
        crate::debug!("style"; "wrote {}", ctx.display(&out.dest));
    }
    Ok(TaskOutcome::Succeeded { written })
}

struct Compiled {
    dest: PathBuf,
    css: String,
    map: Option<String>,
}

/// `style.scss` -> `style.min.css`
pub(super) fn min_css_path(dest: &Path) -> PathBuf {
    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!("{stem}.min.css"))
}

/// `style.min.css` -> `style.min.css.map`
pub(super) fn map_path(css: &Path) -> PathBuf {
    let mut name = css.file_name().unwrap_or_default().to_os_string();
    name.push(".map");
    css.with_file_name(name)
}

fn compile(ctx: &TaskContext, file: &SourceFile) -> Result<Compiled, TaskError> {
    let style = &ctx.config.style;

    let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
    if let Some(dir) = file.path.parent() {
        options = options.load_path(dir);
    }
    for dir in &style.load_paths {
        options = options.load_path(ctx.table.source().join(dir));
    }

    let css = grass::from_path(&file.path, &options).map_err(|e| sass_error(&file.path, *e))?;
    let dest = min_css_path(&file.dest);
    if !style.sourcemap {
        return Ok(Compiled {
            css: process_css(&css, &file.path, style, None)?,
            dest,
            map: None,
        });
    }

    let map_error = |e: parcel_sourcemap::SourceMapError| TaskError::tooling(&file.path, e);
    // Only source of a fresh map, so index 0 as the parser assumes.
    let mut map = SourceMap::new("/");
    let index = map.add_source(&file.rel);
    map.set_source_content(index as usize, &css).map_err(map_error)?;

    let mut code = process_css(&css, &file.path, style, Some(&mut map))?;
    let json = map.to_json(None).map_err(map_error)?;
    let url = map_path(&dest);
    let url = url.file_name().unwrap_or_default().to_string_lossy();
    code.push_str(&format!("\n/*# sourceMappingURL={url} */"));

    Ok(Compiled {
        dest,
        css: code,
        map: Some(json),
    })
}

/// Translate a grass error, pointing at the partial that failed.
fn sass_error(entry: &Path, err: grass::Error) -> TaskError {
    let message = err.to_string();
    match err.kind() {
        grass::ErrorKind::ParseError { message, loc, .. } => {
            let name = loc.file.name();
            let path = if name.is_empty() {
                entry.to_path_buf()
            } else {
                PathBuf::from(name)
            };
            TaskError::Compile {
                path,
                line: u32::try_from(loc.begin.line + 1).ok(),
                column: u32::try_from(loc.begin.column + 1).ok(),
                message,
            }
        }
        _ => TaskError::Compile {
            path: entry.to_path_buf(),
            line: None,
            column: None,
            message,
        },
    }
}

/// Vendor-prefix and minify compiled CSS against the browserslist targets,
/// recording mappings into `source_map` when given.
pub fn process_css(
    css: &str,
    path: &Path,
    style: &StyleConfig,
    source_map: Option<&mut SourceMap>,
) -> Result<String, TaskError> {
    let targets = style.browsers().map(Targets::from).unwrap_or_default();
    let css_error = |message: String, loc: Option<lightningcss::error::ErrorLocation>| {
        TaskError::Compile {
            path: path.to_path_buf(),
            line: loc.as_ref().map(|l| l.line + 1),
            column: loc.as_ref().map(|l| l.column),
            message,
        }
    };

    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: path.display().to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| css_error(e.kind.to_string(), e.loc))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| css_error(e.kind.to_string(), e.loc))?;

    let output = sheet
        .to_css(PrinterOptions {
            minify: style.minify,
            targets,
            source_map,
            ..PrinterOptions::default()
        })
        .map_err(|e| css_error(e.kind.to_string(), e.loc))?;

    Ok(output.code)
}
