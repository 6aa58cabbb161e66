//! Template interpolation for request parameters
//!
//! REST streams declare query parameters as `{{ variable }}` templates,
//! e.g. `("skip", "{{ page.offset }}")`. Three roots are available:
//! `config` (tap configuration), `context` (parent-supplied values for child
//! streams), and `page` (the current page token).

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template pattern is valid")
});

/// Values a template may reference
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Tap configuration
    pub config: Value,
    /// Parent-supplied stream context
    pub context: Value,
    /// Current page (`offset`, `first`, `from`)
    pub page: Value,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: Value) -> Self {
        self.page = page;
        self
    }

    /// Resolve a dotted variable path; the first segment names the root
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let root = match parts.next()? {
            "config" => &self.config,
            "context" => &self.context,
            "page" => &self.page,
            _ => return None,
        };
        parts.try_fold(root, |current, part| current.as_object()?.get(part))
    }
}

/// Render a template string, failing on any undefined variable
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();
    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &Captures<'_>| {
        let var = &cap[1];
        match ctx.get(var) {
            Some(value) => value_to_string(value),
            None => {
                missing.push(var.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Render `(name, template)` pairs into query parameters
pub fn render_params(
    params: &[(&str, &str)],
    ctx: &TemplateContext,
) -> Result<Vec<(String, String)>> {
    params
        .iter()
        .map(|(name, template)| Ok(((*name).to_string(), render(template, ctx)?)))
        .collect()
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_substitution() {
        let ctx = TemplateContext::new().with_page(json!({"offset": 2000, "first": 1000}));

        assert_eq!(render("{{ page.offset }}", &ctx).unwrap(), "2000");
        assert_eq!(
            render("skip={{page.offset}}&first={{ page.first }}", &ctx).unwrap(),
            "skip=2000&first=1000"
        );
    }

    #[test]
    fn test_config_and_context_roots() {
        let ctx = TemplateContext::new()
            .with_config(json!({"metadata_api_url": "https://nft-api.decentraland.org"}))
            .with_context(json!({"estate": {"id": "estate-42"}}));

        assert_eq!(
            render("{{ config.metadata_api_url }}/v1/items", &ctx).unwrap(),
            "https://nft-api.decentraland.org/v1/items"
        );
        assert_eq!(render("{{ context.estate.id }}", &ctx).unwrap(), "estate-42");
    }

    #[test]
    fn test_undefined_variables_are_reported() {
        let ctx = TemplateContext::new().with_page(json!({"offset": 0}));
        let err = render("{{ page.first }} {{ page.offset }} {{ config.x }}", &ctx).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("page.first"));
        assert!(message.contains("config.x"));
        assert!(!message.contains("page.offset"));
    }

    #[test]
    fn test_unknown_root() {
        let ctx = TemplateContext::new().with_page(json!({"offset": 0}));
        assert!(render("{{ offset }}", &ctx).is_err());
    }

    #[test]
    fn test_render_params() {
        let ctx = TemplateContext::new().with_page(json!({"offset": 0, "first": 1000}));
        let params = render_params(
            &[("skip", "{{ page.offset }}"), ("first", "{{ page.first }}"), ("sortBy", "newest")],
            &ctx,
        )
        .unwrap();

        assert_eq!(
            params,
            vec![
                ("skip".to_string(), "0".to_string()),
                ("first".to_string(), "1000".to_string()),
                ("sortBy".to_string(), "newest".to_string()),
            ]
        );
    }

    #[test]
    fn test_null_and_bool_values() {
        let ctx = TemplateContext::new().with_config(json!({"flag": true, "empty": null}));
        assert_eq!(render("{{ config.flag }}|{{ config.empty }}", &ctx).unwrap(), "true|");
    }

    #[test]
    fn test_has_templates() {
        assert!(has_templates("{{ page.offset }}"));
        assert!(!has_templates("{ page.offset }"));
        assert!(!has_templates("newest"));
    }
}
