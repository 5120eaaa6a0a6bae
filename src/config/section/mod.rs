//! Configuration section definitions.
//!
//! Each module corresponds to a section in `sitepack.toml`:
//!
//! | Module   | TOML Section | Purpose                                  |
//! |----------|--------------|------------------------------------------|
//! | `paths`  | `[paths]`    | Source/output roots, category overrides  |
//! | `style`  | `[style]`    | Browserslist targets, minification       |
//! | `image`  | `[image]`    | JPEG quality, webp siblings              |
//! | `markup` | `[markup]`   | HTML minification, cache-busting         |
//! | `serve`  | `[serve]`    | Development server                       |

mod image;
mod markup;
mod paths;
mod serve;
mod style;

pub use image::ImageConfig;
pub use markup::{MarkupConfig, VersionConfig};
pub use paths::{CategoryOverride, PathsConfig};
pub use serve::ServeConfig;
pub use style::StyleConfig;
