//! Cache-busting of stylesheet and script references.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::utils::path::route::{is_external_ref, query_has_key, split_suffix};

/// `<link ...>` and `<script ...>` start tags.
static ASSET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<(link|script)\b[^>]*>"#).unwrap());

/// A quoted `href` or `src` attribute inside a tag.
static ASSET_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\s(href|src)\s*=\s*)("([^"]*)"|'([^']*)')"#).unwrap()
});

/// Appends `<key>=<token>` to local stylesheet and script references.
pub struct Versioner<'a> {
    token: &'a str,
    key: &'a str,
}

/// Contents of `version.json`.
#[derive(Debug, Default, Serialize)]
pub struct VersionManifest {
    pub version: String,
    pub assets: BTreeMap<String, String>,
}

impl<'a> Versioner<'a> {
    pub fn new(token: &'a str, key: &'a str) -> Self {
        Self { token, key }
    }

    /// Rewrite references in `html`, returning the new page and the
    /// `original → rewritten` pairs.
    pub fn rewrite(&self, html: &str) -> (String, Vec<(String, String)>) {
        let mut rewrites = Vec::new();
        let page = ASSET_TAG.replace_all(html, |tag: &Captures| {
            let element = tag[1].to_ascii_lowercase();
            let wanted = if element == "link" { "href" } else { "src" };

            ASSET_ATTR
                .replace_all(&tag[0], |attr: &Captures| {
                    let name = attr[2].to_ascii_lowercase();
                    let value = attr
                        .get(4)
                        .or_else(|| attr.get(5))
                        .map_or("", |m| m.as_str());

                    match self.versioned(value).filter(|_| name == wanted) {
                        Some(versioned) => {
                            let quote = &attr[3][..1];
                            let out = format!("{}{quote}{versioned}{quote}", &attr[1]);
                            rewrites.push((value.to_string(), versioned));
                            out
                        }
                        None => attr[0].to_string(),
                    }
                })
                .into_owned()
        });
        (page.into_owned(), rewrites)
    }

    /// Versioned form of a reference, or `None` when it is left alone.
    pub fn versioned(&self, link: &str) -> Option<String> {
        if link.is_empty() || is_external_ref(link) {
            return None;
        }
        let (path, suffix) = split_suffix(link);
        let is_asset = path.ends_with(".css") || path.ends_with(".js");
        if !is_asset || query_has_key(suffix, self.key) {
            return None;
        }

        let (query, fragment) = match suffix.find('#') {
            Some(pos) => suffix.split_at(pos),
            None => (suffix, ""),
        };
        let separator = if query.len() > 1 {
            "&"
        } else if query == "?" {
            ""
        } else {
            "?"
        };
        Some(format!(
            "{path}{query}{separator}{}={}{fragment}",
            self.key, self.token
        ))
    }
}

impl VersionManifest {
    pub fn new(token: &str) -> Self {
        Self {
            version: token.to_string(),
            assets: BTreeMap::new(),
        }
    }

    pub fn extend(&mut self, rewrites: impl IntoIterator<Item = (String, String)>) {
        self.assets.extend(rewrites);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self).map(|mut s| {
            s.push('\n');
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "20240101000000";

    fn versioner() -> Versioner<'static> {
        Versioner::new(TOKEN, "_v")
    }

    #[test]
    fn test_versioned_plain() {
        assert_eq!(
            versioner().versioned("css/style.min.css").as_deref(),
            Some("css/style.min.css?_v=20240101000000")
        );
    }

    #[test]
    fn test_versioned_existing_query_and_fragment() {
        let v = versioner();
        assert_eq!(
            v.versioned("js/script.js?mode=a#top").as_deref(),
            Some("js/script.js?mode=a&_v=20240101000000#top")
        );
        assert_eq!(
            v.versioned("js/script.js#top").as_deref(),
            Some("js/script.js?_v=20240101000000#top")
        );
    }

    #[test]
    fn test_versioned_skips() {
        let v = versioner();
        assert_eq!(v.versioned("css/style.css?_v=1"), None);
        assert_eq!(v.versioned("https://cdn.example.com/lib.js"), None);
        assert_eq!(v.versioned("//cdn.example.com/lib.css"), None);
        assert_eq!(v.versioned("img/logo.png"), None);
        assert_eq!(v.versioned(""), None);
    }

    #[test]
    fn test_rewrite_link_and_script() {
        let html = r#"<link rel="stylesheet" href="css/style.min.css"><script src='js/script.js' defer></script>"#;
        let (page, rewrites) = versioner().rewrite(html);
        assert_eq!(
            page,
            r#"<link rel="stylesheet" href="css/style.min.css?_v=20240101000000"><script src='js/script.js?_v=20240101000000' defer></script>"#
        );
        assert_eq!(rewrites.len(), 2);
        assert_eq!(rewrites[0].0, "css/style.min.css");
    }

    #[test]
    fn test_rewrite_ignores_other_attributes() {
        // `src` on a link and `href` on other tags stay as they are
        let html = r#"<link src="a.css"><a href="b.css">b</a><img src="c.js">"#;
        let (page, rewrites) = versioner().rewrite(html);
        assert_eq!(page, html);
        assert!(rewrites.is_empty());
    }

    #[test]
    fn test_manifest_json() {
        let mut manifest = VersionManifest::new(TOKEN);
        manifest.extend([("js/script.js".to_string(), "js/script.js?_v=1".to_string())]);
        let json: serde_json::Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(json["version"], TOKEN);
        assert_eq!(json["assets"]["js/script.js"], "js/script.js?_v=1");
    }
}
