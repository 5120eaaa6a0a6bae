//! Template types for typed variable injection.

use std::marker::PhantomData;

/// Trait for template variable sets
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;

    /// Input to the URL fingerprint. Rendered variants with different
    /// variables must differ here so browsers never reuse a stale copy.
    fn hash_input(&self) -> String {
        String::new()
    }
}

/// Embedded text with typed variable injection, served under a
/// content-addressed URL.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    /// URL stem and extension, e.g. `("hotreload", "js")`
    name: &'static str,
    ext: &'static str,
    content: &'static str,
    _marker: PhantomData<V>,
}

/// URL prefix reserved for dev server assets.
const ASSET_PREFIX: &str = "/__sitepack";

impl<V> Template<V> {
    pub const fn new(name: &'static str, ext: &'static str, content: &'static str) -> Self {
        Self {
            name,
            ext,
            content,
            _marker: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }

    /// `/__sitepack/<name>-<fingerprint>.<ext>`
    pub fn url_path(&self, vars: &V) -> String {
        let input = format!("{}{}", self.content, vars.hash_input());
        let hash = crate::utils::hash::fingerprint(&input);
        format!("{ASSET_PREFIX}/{}-{hash}.{}", self.name, self.ext)
    }

    /// `<script>` tag referencing [`Self::url_path`].
    pub fn script_tag(&self, vars: &V) -> String {
        format!(r#"<script src="{}"></script>"#, self.url_path(vars))
    }
}
