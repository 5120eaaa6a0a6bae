//! `[image]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [image]
//! jpeg_quality = 82   # 1-100, re-encode quality for JPEG sources
//! webp = true         # emit lossless .webp siblings for raster images
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub jpeg_quality: u8,
    pub webp: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 82,
            webp: true,
        }
    }
}

impl ImageConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !(1..=100).contains(&self.jpeg_quality) {
            diag.error(
                FieldPath::new("image.jpeg_quality"),
                format!("must be between 1 and 100, got {}", self.jpeg_quality),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_image_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.image.jpeg_quality, 82);
        assert!(config.image.webp);
    }

    #[test]
    fn test_quality_range() {
        let config = test_parse_config("[image]\njpeg_quality = 0");
        let mut diag = ConfigDiagnostics::new();
        config.image.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
