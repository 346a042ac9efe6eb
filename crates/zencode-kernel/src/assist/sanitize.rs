//! Sanitation step between model text and rendered HTML.
//!
//! The model is the only producer of assist HTML and is treated as trusted by
//! default. Deployments that render into a privileged context can plug in
//! [`ScriptStripper`] (or their own implementation) without touching the
//! coordinator.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Transforms a model-produced fragment before it is rendered.
pub trait HtmlSanitizer: Send + Sync {
    /// Name for logs and config ("trusted", "strip-scripts").
    fn name(&self) -> &str;

    fn sanitize(&self, fragment: &str) -> String;
}

/// Pass-through: the remote service is the sole, trusted producer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustedSource;

impl HtmlSanitizer for TrustedSource {
    fn name(&self) -> &str {
        "trusted"
    }

    fn sanitize(&self, fragment: &str) -> String {
        fragment.to_string()
    }
}

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|iframe|object|embed)\b[^>]*>.*?</(script|style|iframe|object|embed)\s*>")
        .expect("static regex")
});

static SELF_CLOSING_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(script|iframe|object|embed)\b[^>]*/?>").expect("static regex")
});

static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<[a-z][^>]*?)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("static regex")
});

static JS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(href|src)\s*=\s*("\s*javascript:[^"]*"|'\s*javascript:[^']*'|javascript:[^\s>]*)"#)
        .expect("static regex")
});

/// Removes executable content: script/style/iframe/object/embed elements,
/// inline `on*=` handlers, and `javascript:` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptStripper;

impl ScriptStripper {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlSanitizer for ScriptStripper {
    fn name(&self) -> &str {
        "strip-scripts"
    }

    fn sanitize(&self, fragment: &str) -> String {
        let out = SCRIPT_BLOCK.replace_all(fragment, "");
        let out = SELF_CLOSING_EMBED.replace_all(&out, "");
        // One handler per tag per pass; repeat until the tags are clean.
        let mut out = out.into_owned();
        loop {
            let next = match EVENT_HANDLER.replace_all(&out, "$1") {
                Cow::Borrowed(_) => break,
                Cow::Owned(next) => next,
            };
            out = next;
        }
        JS_URL.replace_all(&out, "$1=\"#\"").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_is_identity() {
        let html = "<p onclick=\"x()\">hi</p><script>1</script>";
        assert_eq!(TrustedSource.sanitize(html), html);
    }

    #[test]
    fn test_strips_script_and_style_blocks() {
        let html = "<p>a</p><SCRIPT type=\"text/javascript\">\nalert(1)\n</script><style>p{}</style><p>b</p>";
        assert_eq!(ScriptStripper.sanitize(html), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_strips_event_handlers() {
        let html = "<img src=\"a.png\" onerror='boom()' alt=x><a onmouseover=go>link</a>";
        assert_eq!(
            ScriptStripper.sanitize(html),
            "<img src=\"a.png\" alt=x><a>link</a>"
        );
    }

    #[test]
    fn test_neutralizes_javascript_urls() {
        let html = "<a href=\"javascript:alert(1)\">x</a>";
        assert_eq!(ScriptStripper.sanitize(html), "<a href=\"#\">x</a>");
    }

    #[test]
    fn test_keeps_code_samples() {
        let html = "<pre><code class=\"language-javascript\">console.log(\"hi\");</code></pre>";
        assert_eq!(ScriptStripper.sanitize(html), html);
    }
}
