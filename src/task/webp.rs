//! `rasterize-webp`: lossless `.webp` siblings for every raster image.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use image::codecs::webp::WebPEncoder;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::image::{decode, is_raster};
use super::{TaskContext, TaskError, TaskId, TaskOutcome, TaskResult};
use crate::paths::{AssetKind, SourceFile};

pub fn run(ctx: &TaskContext) -> TaskResult {
    if !ctx.config.image.webp {
        crate::debug!("task"; "rasterize-webp disabled");
        return Ok(TaskOutcome::Succeeded { written: 0 });
    }

    let files: Vec<_> = ctx
        .inputs(TaskId::RasterizeWebp, AssetKind::Image)
        .into_iter()
        .filter(|file| is_raster(&file.path))
        .collect();
    check_targets(&files)?;

    let encoded = files
        .par_iter()
        .map(|file| encode(file).map(|bytes| (file, bytes)))
        .collect::<Result<Vec<_>, TaskError>>()?;

    for (file, bytes) in &encoded {
        ctx.write_output(&webp_path(&file.dest), bytes)?;
    }
    Ok(TaskOutcome::Succeeded {
        written: encoded.len(),
    })
}

/// `img/a.jpg` -> `img/a.webp`
pub(super) fn webp_path(dest: &Path) -> PathBuf {
    dest.with_extension("webp")
}

/// `a.jpg` and `a.png` in one directory would share `a.webp`.
fn check_targets(files: &[SourceFile]) -> Result<(), TaskError> {
    let mut seen: FxHashMap<PathBuf, &str> = FxHashMap::default();
    for file in files {
        if let Some(first) = seen.insert(webp_path(&file.dest), &file.rel) {
            return Err(TaskError::tooling(
                &file.path,
                format!("webp output collides with {first}"),
            ));
        }
    }
    Ok(())
}

fn encode(file: &SourceFile) -> Result<Vec<u8>, TaskError> {
    let (_, image) = decode(file)?;
    // The encoder only takes 8-bit RGB(A)
    let rgba = DynamicImage::ImageRgba8(image.to_rgba8());

    let mut out = Vec::new();
    rgba.write_with_encoder(WebPEncoder::new_lossless(&mut out))
        .map_err(|e| TaskError::tooling(&file.path, e))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{raster_fixture, test_context, write_source};
    use image::ImageFormat;
    use tempfile::TempDir;

    #[test]
    fn test_webp_siblings() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "img/a.jpg", raster_fixture(ImageFormat::Jpeg));
        write_source(dir.path(), "img/b.png", raster_fixture(ImageFormat::Png));
        write_source(
            dir.path(),
            "img/c.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#,
        );
        let ctx = test_context(dir.path());

        let outcome = run(&ctx).unwrap();
        assert_eq!(outcome.written(), 2);

        let out = ctx.table.output().join("img");
        for name in ["a.webp", "b.webp"] {
            let img = image::open(out.join(name)).unwrap();
            assert_eq!((img.width(), img.height()), (32, 24));
        }
        assert!(!out.join("c.webp").exists());
    }

    #[test]
    fn test_lossless_pixels() {
        let dir = TempDir::new().unwrap();
        let png = raster_fixture(ImageFormat::Png);
        write_source(dir.path(), "img/b.png", &png);
        let ctx = test_context(dir.path());

        run(&ctx).unwrap();
        let original = image::load_from_memory(&png).unwrap().to_rgba8();
        let webp = image::open(ctx.table.output().join("img/b.webp"))
            .unwrap()
            .to_rgba8();
        assert_eq!(original, webp);
    }

    #[test]
    fn test_same_stem_rasters_rejected() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "img/a.jpg", raster_fixture(ImageFormat::Jpeg));
        write_source(dir.path(), "img/a.png", raster_fixture(ImageFormat::Png));
        write_source(dir.path(), "img/photos/a.png", raster_fixture(ImageFormat::Png));
        let ctx = test_context(dir.path());

        let err = run(&ctx).unwrap_err();
        assert_eq!(err.kind(), "tooling");
        assert!(err.to_string().contains("img/a.jpg"), "{err}");
        assert!(!ctx.table.output().join("img/a.webp").exists());
    }

    #[test]
    fn test_disabled() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "img/a.jpg", raster_fixture(ImageFormat::Jpeg));
        let mut ctx = test_context(dir.path());
        let mut config = (*ctx.config).clone();
        config.image.webp = false;
        ctx.config = std::sync::Arc::new(config);

        assert_eq!(run(&ctx).unwrap().written(), 0);
        assert!(!ctx.table.output().join("img/a.webp").exists());
    }
}
