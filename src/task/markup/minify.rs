//! Whitespace collapsing via `minify-html`.
//!
//! Inline CSS and JS are left alone: `script` and `style` bodies, like
//! `pre` and `textarea`, come out byte for byte. Comments are dropped.

use minify_html::Cfg;

fn config() -> Cfg {
    let mut cfg = Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = false;
    cfg.minify_js = false;
    cfg
}

pub fn collapse_whitespace(html: &str) -> Vec<u8> {
    minify_html::minify(html.as_bytes(), &config())
}
