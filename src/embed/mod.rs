//! Embedded static resources for the dev server.
//!
//! - `template` - Template type for typed variable injection
//! - `serve` - live-reload client (hotreload.js)

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Variables for hotreload.js.
    pub struct HotreloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for HotreloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__SITEPACK_WS_PORT__", &self.ws_port.to_string())
        }

        fn hash_input(&self) -> String {
            self.ws_port.to_string()
        }
    }

    /// Live-reload client with WebSocket port injection.
    pub const HOTRELOAD_JS: Template<HotreloadVars> =
        Template::new("hotreload", "js", include_str!("serve/hotreload.js"));
}

#[cfg(test)]
mod tests {
    use super::serve::{HOTRELOAD_JS, HotreloadVars};

    #[test]
    fn test_hotreload_js_with_vars() {
        let vars = HotreloadVars { ws_port: 35729 };
        let rendered = HOTRELOAD_JS.render(&vars);
        assert!(rendered.contains("35729"));
        assert!(!rendered.contains("__SITEPACK_WS_PORT__"));

        let url = HOTRELOAD_JS.url_path(&vars);
        assert!(url.starts_with("/__sitepack/hotreload-"));
        assert!(url.ends_with(".js"));
    }

    #[test]
    fn test_url_changes_with_port() {
        let a = HOTRELOAD_JS.url_path(&HotreloadVars { ws_port: 35729 });
        let b = HOTRELOAD_JS.url_path(&HotreloadVars { ws_port: 35730 });
        assert_ne!(a, b);
    }

    #[test]
    fn test_script_tag() {
        let vars = HotreloadVars { ws_port: 35729 };
        let tag = HOTRELOAD_JS.script_tag(&vars);
        assert_eq!(tag, format!(r#"<script src="{}"></script>"#, HOTRELOAD_JS.url_path(&vars)));
    }
}
