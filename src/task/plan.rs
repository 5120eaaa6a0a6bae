//! Every destination a full build writes, checked before any task runs.
//!
//! Tasks rename some outputs (`.min.css`, `.webp`, `sprite.svg`), so two
//! distinct sources can still land on one path:
//!
//! ```text
//! img/a.jpg, img/a.png             -> build/img/a.webp
//! img/sprite.svg, img/icons/*.svg  -> build/img/sprite.svg
//! ```

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use super::image::{is_raster, is_svg};
use super::{TaskContext, TaskId, markup, sprite, style, webp};
use crate::config::ConfigDiagnostics;
use crate::paths::{AssetKind, scan_category};

/// One output and the task and source that produce it.
#[derive(Debug)]
struct Planned {
    dest: PathBuf,
    task: TaskId,
    kind: AssetKind,
    from: String,
}

fn planned(ctx: &TaskContext) -> Vec<Planned> {
    let config = &ctx.config;
    let mut out = Vec::new();

    for task in TaskId::ALL {
        let Some(kind) = task.reads() else { continue };
        let files = scan_category(&ctx.table, kind).files;
        let mut push = |dest: PathBuf, from: &str| {
            out.push(Planned {
                dest,
                task,
                kind,
                from: from.to_string(),
            });
        };

        match task {
            TaskId::Clean => {}
            TaskId::CopyFonts | TaskId::MinifyScripts => {
                for file in &files {
                    push(file.dest.clone(), &file.rel);
                }
            }
            TaskId::OptimizeImages => {
                for file in files.iter().filter(|f| is_raster(&f.path) || is_svg(&f.path)) {
                    push(file.dest.clone(), &file.rel);
                }
            }
            TaskId::RasterizeWebp => {
                if !config.image.webp {
                    continue;
                }
                for file in files.iter().filter(|f| is_raster(&f.path)) {
                    push(webp::webp_path(&file.dest), &file.rel);
                }
            }
            TaskId::CompileStyles => {
                for file in &files {
                    let css = style::min_css_path(&file.dest);
                    if config.style.sourcemap {
                        push(style::map_path(&css), &file.rel);
                    }
                    push(css, &file.rel);
                }
            }
            TaskId::MinifyHtml => {
                for file in &files {
                    push(file.dest.clone(), &file.rel);
                }
                if config.markup.version.enable && !files.is_empty() {
                    push(markup::manifest_path(ctx), "[markup.version] manifest");
                }
            }
            TaskId::BuildSprite => {
                if !files.is_empty() {
                    push(sprite::sprite_path(&ctx.table), "icon sprite");
                }
            }
        }
    }
    out
}

/// Reject destinations that two producers would write.
pub fn check_destinations(ctx: &TaskContext) -> Result<(), ConfigDiagnostics> {
    let mut owners: FxHashMap<PathBuf, Vec<Planned>> = FxHashMap::default();
    for output in planned(ctx) {
        owners.entry(output.dest.clone()).or_default().push(output);
    }

    let mut clashes: Vec<_> = owners
        .into_iter()
        .filter(|(_, producers)| producers.len() > 1)
        .collect();
    clashes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut diag = ConfigDiagnostics::new();
    for (dest, producers) in clashes {
        let names: Vec<_> = producers
            .iter()
            .map(|p| format!("{} ({})", p.task, p.from))
            .collect();
        diag.error_with_hint(
            producers[1].kind.field_path(),
            format!("`{}` would be written by {}", ctx.display(&dest), names.join(" and ")),
            "rename one of the sources or exclude it from its category",
        );
    }
    diag.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{raster_fixture, test_context, write_source};
    use image::ImageFormat;
    use std::sync::Arc;
    use tempfile::TempDir;

    const ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0L24 24"/></svg>"#;

    fn messages(ctx: &TaskContext) -> Vec<String> {
        match check_destinations(ctx) {
            Ok(()) => Vec::new(),
            Err(diag) => diag.errors().iter().map(|e| e.message.clone()).collect(),
        }
    }

    #[test]
    fn test_distinct_outputs_accepted() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "fonts/inter.woff2", b"wOF2fake");
        write_source(dir.path(), "sass/style.scss", ".a { color: red; }\n");
        write_source(dir.path(), "js/script.js", "console.log(1);\n");
        write_source(dir.path(), "index.html", "<p>Hi</p>\n");
        write_source(dir.path(), "img/a.jpg", raster_fixture(ImageFormat::Jpeg));
        write_source(dir.path(), "img/b.png", raster_fixture(ImageFormat::Png));
        write_source(dir.path(), "img/icons/close.svg", ICON);
        let ctx = test_context(dir.path());

        assert!(messages(&ctx).is_empty());
    }

    #[test]
    fn test_image_named_like_sprite_rejected() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "img/sprite.svg", ICON);
        write_source(dir.path(), "img/icons/close.svg", ICON);
        let ctx = test_context(dir.path());

        let found = messages(&ctx);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("build/img/sprite.svg"), "{}", found[0]);
        assert!(found[0].contains("optimize-images (img/sprite.svg)"));
        assert!(found[0].contains("build-sprite"));
    }

    #[test]
    fn test_sprite_name_free_without_icons() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "img/sprite.svg", ICON);
        let ctx = test_context(dir.path());

        assert!(messages(&ctx).is_empty());
    }

    #[test]
    fn test_same_stem_webp_rejected() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "img/a.jpg", raster_fixture(ImageFormat::Jpeg));
        write_source(dir.path(), "img/a.png", raster_fixture(ImageFormat::Png));
        let mut ctx = test_context(dir.path());

        let found = messages(&ctx);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("build/img/a.webp"), "{}", found[0]);

        let mut config = (*ctx.config).clone();
        config.image.webp = false;
        ctx.config = Arc::new(config);
        assert!(messages(&ctx).is_empty());
    }

    #[test]
    fn test_cross_category_clash_rejected() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "sass/style.scss", ".a { color: red; }\n");
        write_source(dir.path(), "js/style.min.css", ".b{}");
        let mut ctx = test_context(dir.path());
        let mut config = (*ctx.config).clone();
        config.paths.script.include = Some(vec!["js/*".into()]);
        config.paths.script.dest = Some("css".into());
        ctx.table = Arc::new(crate::paths::PathTable::from_config(&config).unwrap());
        ctx.config = Arc::new(config);

        let err = check_destinations(&ctx).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].field.as_str(), "paths.script");
        assert!(
            err.errors()[0]
                .message
                .contains("compile-styles (sass/style.scss) and minify-scripts (js/style.min.css)"),
            "{}",
            err.errors()[0].message
        );
    }
}
