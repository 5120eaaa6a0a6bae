//! `optimize-images`: recompress rasters and optimize standalone SVGs.

use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use rayon::prelude::*;

use super::{TaskContext, TaskError, TaskId, TaskOutcome, TaskResult};
use crate::paths::{AssetKind, SourceFile};

/// Raster extensions handled by the image tasks.
pub const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| RASTER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

pub fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

pub fn run(ctx: &TaskContext) -> TaskResult {
    let files = ctx.inputs(TaskId::OptimizeImages, AssetKind::Image);
    let quality = ctx.config.image.jpeg_quality;

    let optimized = files
        .par_iter()
        .filter_map(|file| {
            let result = if is_raster(&file.path) {
                optimize_raster(file, quality)
            } else if is_svg(&file.path) {
                optimize_svg(file)
            } else {
                return None;
            };
            Some(result.map(|bytes| (file, bytes)))
        })
        .collect::<Result<Vec<_>, TaskError>>()?;

    for (file, bytes) in &optimized {
        ctx.write_output(&file.dest, bytes)?;
    }
    Ok(TaskOutcome::Succeeded {
        written: optimized.len(),
    })
}

/// Decode a raster file from disk.
pub fn decode(file: &SourceFile) -> Result<(Vec<u8>, DynamicImage), TaskError> {
    let bytes = fs::read(&file.path).map_err(|e| TaskError::fs(&file.path, e))?;
    let format = ImageFormat::from_path(&file.path).map_err(|e| TaskError::tooling(&file.path, e))?;
    let image = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| TaskError::tooling(&file.path, e))?;
    Ok((bytes, image))
}

/// Re-encode a raster, keeping whichever of old and new is smaller.
fn optimize_raster(file: &SourceFile, quality: u8) -> Result<Vec<u8>, TaskError> {
    let (original, image) = decode(file)?;
    let format = ImageFormat::from_path(&file.path).map_err(|e| TaskError::tooling(&file.path, e))?;

    let mut encoded = Vec::new();
    let result = match format {
        ImageFormat::Png => image.write_with_encoder(PngEncoder::new_with_quality(
            &mut encoded,
            CompressionType::Best,
            FilterType::Adaptive,
        )),
        _ => image.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, quality)),
    };
    result.map_err(|e| TaskError::tooling(&file.path, e))?;

    Ok(smaller(original, encoded))
}

fn smaller(original: Vec<u8>, encoded: Vec<u8>) -> Vec<u8> {
    if encoded.len() < original.len() {
        encoded
    } else {
        original
    }
}

/// Re-serialize an SVG through usvg with no indentation.
fn optimize_svg(file: &SourceFile) -> Result<Vec<u8>, TaskError> {
    let content = fs::read(&file.path).map_err(|e| TaskError::fs(&file.path, e))?;
    let tree = usvg::Tree::from_data(&content, &usvg::Options::default())
        .map_err(|e| TaskError::tooling(&file.path, format!("failed to parse SVG: {e}")))?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };
    Ok(tree.to_string(&write_options).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{raster_fixture as fixture, test_context, write_source};
    use tempfile::TempDir;

    #[test]
    fn test_is_raster() {
        assert!(is_raster(Path::new("img/a.JPG")));
        assert!(is_raster(Path::new("img/b.png")));
        assert!(!is_raster(Path::new("img/c.svg")));
    }

    #[test]
    fn test_smaller_keeps_original() {
        assert_eq!(smaller(vec![1, 2], vec![1, 2, 3]), vec![1, 2]);
        assert_eq!(smaller(vec![1, 2, 3], vec![1]), vec![1]);
    }

    #[test]
    fn test_optimize_rasters() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "img/a.jpg", fixture(ImageFormat::Jpeg));
        write_source(dir.path(), "img/photos/b.png", fixture(ImageFormat::Png));
        let ctx = test_context(dir.path());

        let outcome = run(&ctx).unwrap();
        assert_eq!(outcome.written(), 2);

        let out = ctx.table.output().join("img");
        let a = image::open(out.join("a.jpg")).unwrap();
        assert_eq!((a.width(), a.height()), (32, 24));
        let b = fs::read(out.join("photos/b.png")).unwrap();
        assert!(b.len() <= fixture(ImageFormat::Png).len());
    }

    #[test]
    fn test_icons_are_not_images() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "img/icons/close.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#,
        );
        let ctx = test_context(dir.path());

        run(&ctx).unwrap();
        assert!(!ctx.table.output().join("img/icons/close.svg").exists());
    }

    #[test]
    fn test_optimize_svg() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "img/logo.svg",
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\">\n  <!-- logo -->\n  <rect width=\"10\" height=\"10\" fill=\"red\"/>\n</svg>\n",
        );
        let ctx = test_context(dir.path());

        run(&ctx).unwrap();
        let svg = fs::read_to_string(ctx.table.output().join("img/logo.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("logo -->"));
    }

    #[test]
    fn test_broken_image_fails_task() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "img/broken.png", b"not a png");
        let ctx = test_context(dir.path());

        let err = run(&ctx).unwrap_err();
        assert_eq!(err.kind(), "tooling");
        assert!(err.path().ends_with("img/broken.png"));
    }
}
