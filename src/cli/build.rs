//! Full pipeline run.
//!
//! ```text
//! clean -> copy-fonts -> { compile-styles, minify-scripts, minify-html,
//!                          optimize-images, rasterize-webp, build-sprite }
//! ```
//!
//! Every node of the standard graph runs once; independent nodes run in
//! parallel. The build fails when any node failed, degraded or was skipped.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;

use crate::{
    config::{ConfigError, PackConfig},
    graph::{NodeState, RunReport, TaskGraph, scheduler},
    log,
    logger::ProgressLine,
    paths::{PathTable, check_overlaps},
    reload::ReloadHandle,
    task::{TaskContext, TaskId, check_destinations, run_task},
    utils::plural::plural_count,
};

/// Compile the path table, then reject files claimed by two categories and
/// outputs written by two producers.
pub fn prepare(config: Arc<PackConfig>, reload: ReloadHandle) -> Result<TaskContext> {
    let table = PathTable::from_config(&config).context("invalid path pattern")?;
    check_overlaps(&table).map_err(ConfigError::Diagnostics)?;
    let ctx = TaskContext::new(config, Arc::new(table), reload);
    check_destinations(&ctx).map_err(ConfigError::Diagnostics)?;
    Ok(ctx)
}

/// Run the standard graph once, with a progress line.
pub fn run_graph(ctx: &TaskContext) -> Result<RunReport> {
    let graph = TaskGraph::standard()?;
    crate::debug!(
        "build";
        "order: {}",
        graph.topo_order().iter().map(|t| t.name()).collect::<Vec<_>>().join(" -> ")
    );
    let progress = ProgressLine::new(&[("tasks", graph.len())]);

    let report = scheduler::run(&graph, |task| {
        let result = run_task(task, ctx);
        progress.inc("tasks");
        result
    });

    progress.finish();
    Ok(report)
}

/// Print one line per node that did not simply succeed, then a summary.
pub fn print_report(report: &RunReport) {
    for node in &report.nodes {
        match node.state {
            NodeState::Succeeded => {
                crate::debug!(
                    "build";
                    "{} {} in {}ms",
                    node.id,
                    plural_count(node.written, "file"),
                    node.elapsed.as_millis()
                );
            }
            NodeState::Degraded => {
                log!("warning"; "{} degraded, {} skipped:", node.id, plural_count(node.errors.len(), "file"));
                for error in &node.errors {
                    eprintln!("  {} {}", format!("[{}]", error.kind()).dimmed(), error);
                }
            }
            NodeState::Failed => {
                for error in &node.errors {
                    log!("error"; "{} failed: {}", node.id, error);
                }
            }
            NodeState::Skipped => {
                log!("build"; "{} skipped: a dependency failed", node.id);
            }
            NodeState::Pending | NodeState::Running => {}
        }
    }

    let ms = report.elapsed.as_millis();
    if report.is_success() {
        log!("build"; "{} in {}ms", plural_count(report.written(), "file"), ms);
    } else {
        log!(
            "build";
            "{} failed, {} degraded, {} skipped ({}ms)",
            plural_count(report.count(NodeState::Failed), "task"),
            report.count(NodeState::Degraded),
            report.count(NodeState::Skipped),
            ms
        );
    }
}

/// Tasks that failed, with their error text, for the dev overlay.
pub fn failures(report: &RunReport) -> Vec<(TaskId, String)> {
    report
        .nodes
        .iter()
        .filter(|n| n.state == NodeState::Failed)
        .map(|n| {
            let error = n.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
            (n.id, error)
        })
        .collect()
}

/// `sitepack build`
pub fn build(config: Arc<PackConfig>) -> Result<()> {
    let ctx = prepare(config, ReloadHandle::disabled())?;
    let report = run_graph(&ctx)?;
    print_report(&report);

    if !report.is_success() {
        bail!("build did not complete cleanly");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::task::{raster_fixture, write_source};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_source(root, "fonts/inter.woff2", b"wOF2fake");
        write_source(root, "sass/_vars.scss", "$accent: #336699;\n");
        write_source(root, "sass/style.scss", "@use 'vars';\nbody { color: vars.$accent; display: flex; }\n");
        write_source(root, "js/script.js", "const x = 1;\nconsole.log(x);\n");
        write_source(
            root,
            "index.html",
            "<html>\n  <head>\n    <link rel=\"stylesheet\" href=\"css/style.min.css\">\n  </head>\n  <body>\n    <p>Hi</p>\n    <script src=\"js/script.js\"></script>\n  </body>\n</html>\n",
        );
        write_source(root, "img/a.jpg", raster_fixture(::image::ImageFormat::Jpeg));
        write_source(root, "img/b.png", raster_fixture(::image::ImageFormat::Png));
        write_source(root, "img/icons/close.svg", r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0L24 24"/></svg>"#);
        write_source(root, "img/icons/menu.svg", r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 12H24"/></svg>"#);
        dir
    }

    fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                    files.insert(rel, fs::read(&path).unwrap());
                }
            }
        }
        files
    }

    fn run(root: &Path) -> RunReport {
        let ctx = prepare(Arc::new(test_config_at(root)), ReloadHandle::disabled()).unwrap();
        run_graph(&ctx).unwrap()
    }

    #[test]
    fn test_full_build_outputs() {
        let dir = project();
        let report = run(dir.path());
        assert!(report.is_success(), "{report:?}");

        let out = snapshot(&dir.path().join("build"));
        let names: Vec<_> = out.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "css/style.min.css",
                "fonts/inter.woff2",
                "img/a.jpg",
                "img/a.webp",
                "img/b.png",
                "img/b.webp",
                "img/sprite.svg",
                "index.html",
                "js/script.js",
                "version.json",
            ]
        );
    }

    #[test]
    fn test_build_is_idempotent() {
        let dir = project();
        assert!(run(dir.path()).is_success());
        let first = snapshot(&dir.path().join("build"));
        assert!(run(dir.path()).is_success());
        let second = snapshot(&dir.path().join("build"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_style_error_fails_build_and_others_continue() {
        let dir = project();
        write_source(dir.path(), "sass/style.scss", "body { color: ; \n");
        let report = run(dir.path());

        assert!(!report.is_success());
        assert_eq!(report.state(TaskId::CompileStyles), Some(NodeState::Failed));
        assert_eq!(report.state(TaskId::MinifyScripts), Some(NodeState::Succeeded));
        assert!(!dir.path().join("build/css/style.min.css").exists());

        let failed = failures(&report);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, TaskId::CompileStyles);
    }

    #[test]
    fn test_overlapping_categories_rejected() {
        let dir = project();
        let mut config = test_config_at(dir.path());
        config.paths.script.include = Some(vec!["js/*.js".into(), "img/icons/*.svg".into()]);
        assert!(prepare(Arc::new(config), ReloadHandle::disabled()).is_err());
    }

    #[test]
    fn test_output_collisions_rejected_before_running() {
        let dir = project();
        write_source(dir.path(), "img/sprite.svg", r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#);
        write_source(dir.path(), "img/b.jpg", raster_fixture(::image::ImageFormat::Jpeg));

        let err = prepare(Arc::new(test_config_at(dir.path())), ReloadHandle::disabled())
            .err()
            .unwrap();
        let text = err.to_string();
        assert!(text.contains("img/sprite.svg"), "{text}");
        assert!(text.contains("img/b.webp"), "{text}");
        assert!(!dir.path().join("build").exists());
    }
}
