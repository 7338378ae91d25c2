//! Client-side views module generation.
//!
//! The app's registered view templates are serialized into a CommonJS
//! module. On the client the framework calls the exported function with its
//! template helpers and view registry, which recreates every view that isn't
//! marked server-only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-view options carried to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOptions {
    /// Keep this view out of the client bundle.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub server_only: bool,

    /// Custom element tag the view is registered under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Any further options, passed through verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ViewOptions {
    pub fn server_only() -> Self {
        Self {
            server_only: true,
            ..Default::default()
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct View {
    name: String,
    source: String,
    options: ViewOptions,
}

/// Ordered collection of view templates.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    views: Vec<View>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view. Registering the same name again replaces the
    /// template but keeps its original position.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        options: ViewOptions,
    ) {
        let name = name.into();
        let source = source.into();
        match self.views.iter_mut().find(|v| v.name == name) {
            Some(existing) => {
                existing.source = source;
                existing.options = options;
            }
            None => self.views.push(View {
                name,
                source,
                options,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|v| v.name.as_str())
    }

    /// Serialize the client views into module source.
    ///
    /// With `minify` the registrations are packed onto one line.
    pub fn views_source(&self, minify: bool) -> String {
        let registrations: Vec<String> = self
            .views
            .iter()
            .filter(|v| !v.options.server_only)
            .map(register_call)
            .collect();

        if minify {
            format!(
                "module.exports=function(derbyTemplates,views){{{}}};",
                registrations.join("")
            )
        } else {
            let mut out =
                String::from("module.exports = function(derbyTemplates, views) {\n");
            for call in &registrations {
                out.push_str("  ");
                out.push_str(call);
                out.push('\n');
            }
            out.push_str("};\n");
            out
        }
    }
}

fn register_call(view: &View) -> String {
    let options = serde_json::to_value(&view.options).unwrap_or_default();
    let has_options = options.as_object().is_some_and(|o| !o.is_empty());

    let name = js_string(&view.name);
    let source = js_string(&view.source);
    if has_options {
        format!("views.register({name}, {source}, {options});")
    } else {
        format!("views.register({name}, {source});")
    }
}

/// JSON string literal, with the two line terminators JSON allows but
/// older JS engines reject escaped.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_exports_noop() {
        let registry = ViewRegistry::new();
        assert_eq!(
            registry.views_source(false),
            "module.exports = function(derbyTemplates, views) {\n};\n"
        );
        assert_eq!(
            registry.views_source(true),
            "module.exports=function(derbyTemplates,views){};"
        );
    }

    #[test]
    fn registers_views_in_order() {
        let mut registry = ViewRegistry::new();
        registry.register("home", "<h1>{{title}}</h1>", ViewOptions::default());
        registry.register("nav", "<nav></nav>", ViewOptions::default().tag("app-nav"));

        let source = registry.views_source(false);
        let home = source.find(r#"views.register("home", "<h1>{{title}}</h1>");"#);
        let nav = source.find(r#"views.register("nav", "<nav></nav>", {"tag":"app-nav"});"#);
        assert!(home.is_some(), "{source}");
        assert!(nav.is_some(), "{source}");
        assert!(home < nav);
    }

    #[test]
    fn skips_server_only_views() {
        let mut registry = ViewRegistry::new();
        registry.register("email", "<p>secret</p>", ViewOptions::server_only());
        registry.register("page", "<p>public</p>", ViewOptions::default());

        let source = registry.views_source(true);
        assert!(!source.contains("email"));
        assert!(source.contains(r#"views.register("page", "<p>public</p>");"#));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn re_registering_replaces_in_place() {
        let mut registry = ViewRegistry::new();
        registry.register("a", "one", ViewOptions::default());
        registry.register("b", "two", ViewOptions::default());
        registry.register("a", "three", ViewOptions::default());

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
        let source = registry.views_source(false);
        assert!(source.contains(r#""three""#));
        assert!(!source.contains(r#""one""#));
    }

    #[test]
    fn escapes_template_text() {
        let mut registry = ViewRegistry::new();
        registry.register("quote", "say \"hi\"\n\u{2028}", ViewOptions::default());

        let source = registry.views_source(false);
        assert!(source.contains(r#""say \"hi\"\n\u2028""#), "{source}");
    }
}
