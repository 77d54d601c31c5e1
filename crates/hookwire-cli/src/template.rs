//! Template shortcodes declared in configuration.
//!
//! A template is plain text with `{content}`, `{tag}` and `{attr.NAME}`
//! placeholders. The body of an enclosing tag is expanded before it is
//! substituted, so templates nest.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

use hookwire_shortcode::{ShortcodeAttrs, ShortcodeEngine};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(content|tag|attr\.([A-Za-z0-9_-]+))\}")
        .expect("placeholder pattern is valid")
});

/// Registers every template; invalid tag names are skipped with a warning.
pub fn register_all(engine: &ShortcodeEngine, templates: &BTreeMap<String, String>) -> usize {
    let mut registered = 0;
    for (name, template) in templates {
        let template = template.clone();
        let added = engine.add(name, move |engine, attrs, body, tag| {
            let content = body.map(|b| engine.expand(b)).unwrap_or_default();
            render(&template, attrs, &content, tag)
        });
        if added {
            registered += 1;
        } else {
            warn!(shortcode = %name, "Skipping template with invalid tag name");
        }
    }
    registered
}

/// Fills the placeholders of `template`. Unknown attributes render empty.
pub fn render(template: &str, attrs: &ShortcodeAttrs, content: &str, tag: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "content" => content.to_string(),
            "tag" => tag.to_string(),
            _ => caps
                .get(2)
                .and_then(|name| attrs.get(name.as_str()))
                .unwrap_or_default()
                .to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use hookwire_hooks::{HookDispatcher, HookRegistry};
    use hookwire_shortcode::parse_attrs;

    use super::*;

    fn engine() -> ShortcodeEngine {
        let dispatcher = HookDispatcher::new(Rc::new(HookRegistry::new()));
        ShortcodeEngine::new(Rc::new(dispatcher))
    }

    #[test]
    fn test_render_placeholders() {
        let attrs = parse_attrs(r#"href="/docs" rel=next"#);
        let out = render(
            r#"<a href="{attr.href}" rel="{attr.rel}" data-x="{attr.missing}">{content}</a><!-- {tag} -->"#,
            &attrs,
            "Docs",
            "link",
        );
        assert_eq!(
            out,
            r#"<a href="/docs" rel="next" data-x="">Docs</a><!-- link -->"#
        );
    }

    #[test]
    fn test_register_all_skips_invalid_names() {
        let engine = engine();
        let mut templates = BTreeMap::new();
        templates.insert("b".to_string(), "<b>{content}</b>".to_string());
        templates.insert("bad name".to_string(), "x".to_string());

        assert_eq!(register_all(&engine, &templates), 1);
        assert_eq!(engine.tags(), ["b"]);
    }

    #[test]
    fn test_templates_nest() {
        let engine = engine();
        let mut templates = BTreeMap::new();
        templates.insert("b".to_string(), "<b>{content}</b>".to_string());
        templates.insert("i".to_string(), "<i>{content}</i>".to_string());
        register_all(&engine, &templates);

        assert_eq!(
            engine.expand("[b]bold [i]both[/i][/b] [i/]"),
            "<b>bold <i>both</i></b> <i></i>"
        );
    }
}
