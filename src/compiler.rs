//! Total template compilation.
//!
//! Wraps a non-strict Handlebars registry. Compilation never fails from
//! the caller's point of view: any template or render error falls back
//! to the raw HTML and records a diagnostic, so the local preview always
//! has something to show.

use handlebars::Handlebars;
use serde_json::{Map, Value};

use crate::diagnostics::{DiagnosticSource, Diagnostics};

pub struct TemplateCompiler {
    registry: Handlebars<'static>,
    diagnostics: Diagnostics,
}

impl TemplateCompiler {
    pub fn new(diagnostics: Diagnostics) -> Self {
        let mut registry = Handlebars::new();
        // Missing params render as empty rather than erroring; the raw
        // fallback is reserved for genuinely broken templates.
        registry.set_strict_mode(false);
        Self { registry, diagnostics }
    }

    /// Apply `params` to `html`. Returns the compiled markup, or the
    /// input unchanged when compilation fails.
    pub fn compile(&self, html: &str, params: &Map<String, Value>) -> String {
        match self.registry.render_template(html, params) {
            Ok(compiled) => compiled,
            Err(err) => {
                self.diagnostics.record(
                    DiagnosticSource::TemplateCompile,
                    format!("Failed to compile template: {}", err),
                );
                html.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler() -> (TemplateCompiler, Diagnostics) {
        let diags = Diagnostics::new();
        (TemplateCompiler::new(diags.clone()), diags)
    }

    fn params(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn substitutes_params() {
        let (compiler, _) = compiler();
        let out = compiler.compile("<h1>{{title}}</h1>", &params(r#"{"title": "Test"}"#));
        assert_eq!(out, "<h1>Test</h1>");
    }

    #[test]
    fn plain_html_passes_through_unchanged() {
        let (compiler, diags) = compiler();
        let html = "<div class=\"Main\"><p>no placeholders here</p></div>";
        assert_eq!(compiler.compile(html, &Map::new()), html);
        assert!(diags.is_empty());
    }

    #[test]
    fn broken_template_falls_back_to_raw_html() {
        let (compiler, diags) = compiler();
        let html = "<h1>{{#if}}</h1>"; // unclosed block helper
        assert_eq!(compiler.compile(html, &Map::new()), html);
        assert_eq!(diags.count_from(DiagnosticSource::TemplateCompile), 1);
    }

    #[test]
    fn missing_param_renders_empty() {
        let (compiler, diags) = compiler();
        let out = compiler.compile("<h1>{{title}}</h1>", &Map::new());
        assert_eq!(out, "<h1></h1>");
        assert!(diags.is_empty());
    }

    #[test]
    fn nested_and_non_string_params() {
        let (compiler, _) = compiler();
        let out = compiler.compile(
            "{{count}} items for {{user.name}}",
            &params(r#"{"count": 3, "user": {"name": "Ada"}}"#),
        );
        assert_eq!(out, "3 items for Ada");
    }
}
