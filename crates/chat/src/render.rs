//! Role-aware markup for chat messages.
//!
//! User and system text is HTML-escaped verbatim.  Assistant text is a
//! small Markdown subset: fenced code, inline code, `#`–`###` headers,
//! ordered and unordered lists, bold and italic.  Fenced code content is
//! kept raw; everything else has newlines turned into `<br>`.

use std::sync::OnceLock;

use regex::Regex;
use tutor_domain::Role;

/// Render `content` for display according to `role`.
pub fn render(role: Role, content: &str) -> String {
    match role {
        Role::Assistant => markdown_to_html(content),
        Role::User | Role::System => escape_html(content),
    }
}

/// Escape the five HTML-significant characters and turn newlines into
/// `<br>`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            '\n' => out.push_str("<br>"),
            _ => out.push(c),
        }
    }
    out
}

struct Patterns {
    fence: Regex,
    inline_code: Regex,
    h3: Regex,
    h2: Regex,
    h1: Regex,
    ordered: Regex,
    unordered: Regex,
    merge_ul: Regex,
    merge_ol: Regex,
    bold: Regex,
    italic: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static markdown pattern");
        Patterns {
            fence: re(r"(?s)```[A-Za-z0-9_+-]*\n?(.*?)```"),
            inline_code: re(r"`([^`\n]+)`"),
            h3: re(r"(?m)^### (.+)$"),
            h2: re(r"(?m)^## (.+)$"),
            h1: re(r"(?m)^# (.+)$"),
            ordered: re(r"(?m)^[ \t]*\d+\.[ \t]+(.+)$"),
            unordered: re(r"(?m)^[ \t]*[*-][ \t]+(.+)$"),
            merge_ul: re(r"</ul>\s*<ul>"),
            merge_ol: re(r"</ol>\s*<ol>"),
            bold: re(r"\*\*(.+?)\*\*"),
            italic: re(r"\*([^*\n]+?)\*"),
        }
    })
}

/// Convert the supported Markdown subset to HTML.
pub fn markdown_to_html(text: &str) -> String {
    let p = patterns();
    let mut out = String::with_capacity(text.len() + 32);
    let mut last = 0;

    for caps in p.fence.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&render_prose(&text[last..whole.start()]));
        let code = caps.get(1).map_or("", |m| m.as_str());
        out.push_str("<pre><code>");
        out.push_str(code);
        out.push_str("</code></pre>");
        last = whole.end();
    }
    out.push_str(&render_prose(&text[last..]));
    out
}

fn render_prose(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let p = patterns();
    let s = p.inline_code.replace_all(text, "<code>$1</code>");
    let s = p.h3.replace_all(&s, "<h3>$1</h3>");
    let s = p.h2.replace_all(&s, "<h2>$1</h2>");
    let s = p.h1.replace_all(&s, "<h1>$1</h1>");
    let s = p.ordered.replace_all(&s, "<ol><li>$1</li></ol>");
    let s = p.unordered.replace_all(&s, "<ul><li>$1</li></ul>");
    let s = p.merge_ul.replace_all(&s, "");
    let s = p.merge_ol.replace_all(&s, "");
    let s = p.bold.replace_all(&s, "<strong>$1</strong>");
    let s = p.italic.replace_all(&s, "<em>$1</em>");
    s.replace('\n', "<br>")
}
