//! Markdown → Telegram HTML conversion for model replies.
//!
//! Runs a fixed sequence of regex passes. Code is protected first: fenced
//! blocks and inline spans are swapped for placeholder tokens, the
//! remaining text is rewritten (headers, quotes, emphasis, links, rules),
//! and the rendered code is put back last. The pass order matters: escaping
//! runs before anything else, and the emphasis patterns overlap.
//!
//! Never fails. Unbalanced markers are left as literal text.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use uuid::Uuid;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\S+)?\n(.*?)\n```").unwrap());
static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.+?)`").unwrap());
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(#+)\s*(.+)$").unwrap());
static QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^&gt;\s*(.+)$").unwrap());
static BOLD_ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*(.*?)\*\*\*").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static STRIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.*?)~~").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").unwrap());

const HORIZONTAL_RULE: &str = "---";

/// Placeholder delimiters. Private-use code points: no pass ever emits them.
const TOKEN_OPEN: char = '\u{E000}';
const TOKEN_CLOSE: char = '\u{E001}';

/// Convert LLM markdown into the HTML subset Telegram accepts with `parse_mode=HTML`.
pub fn markdown_to_telegram_html(text: &str) -> String {
    let mut code = CodeVault::default();

    let s = escape_html(text);
    let s = code.protect_fences(&s);
    let s = code.protect_inline(&s);

    let s = HEADER_RE.replace_all(&s, "<blockquote>${2}</blockquote>");
    let s = QUOTE_RE.replace_all(&s, "<blockquote>${1}</blockquote>");

    let s = BOLD_ITALIC_RE.replace_all(&s, "<strong>${1}</strong>");
    let s = BOLD_RE.replace_all(&s, "<strong>${1}</strong>");
    let s = ITALIC_RE.replace_all(&s, "<em>${1}</em>");
    let s = STRIKE_RE.replace_all(&s, "<del>${1}</del>");

    let s = LINK_RE.replace_all(&s, "<a href='${2}'>${1}</a>");
    let s = s.replace(HORIZONTAL_RULE, "");

    code.restore(s)
}

/// Escape the characters Telegram HTML reserves.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Rendered code keyed by the placeholder that stands in for it.
#[derive(Default)]
struct CodeVault {
    entries: Vec<(String, String)>,
}

impl CodeVault {
    /// Swap every unescaped fenced block for a token holding its `<pre>` rendering.
    fn protect_fences(&mut self, text: &str) -> String {
        replace_unescaped(&FENCE_RE, text, |caps| {
            let lang = caps.get(1).map(|m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            self.stash(text, render_fence(lang, body))
        })
    }

    /// Swap every unescaped inline span for a token holding its `<code>` rendering.
    fn protect_inline(&mut self, text: &str) -> String {
        replace_unescaped(&INLINE_CODE_RE, text, |caps| {
            let body = caps.get(1).map_or("", |m| m.as_str());
            self.stash(text, format!("<code>{body}</code>"))
        })
    }

    fn stash(&mut self, text: &str, rendered: String) -> String {
        let token = loop {
            let candidate = format!("{TOKEN_OPEN}{}{TOKEN_CLOSE}", Uuid::new_v4().simple());
            let taken = text.contains(&candidate) || self.entries.iter().any(|(t, _)| *t == candidate);
            if !taken {
                break candidate;
            }
        };
        self.entries.push((token.clone(), rendered));
        token
    }

    /// Put rendered code back. Newest first, so a fence token captured inside
    /// an inline span is still resolved.
    fn restore(self, mut text: String) -> String {
        for (token, rendered) in self.entries.into_iter().rev() {
            text = text.replace(&token, &rendered);
        }
        text
    }
}

fn render_fence(lang: Option<&str>, body: &str) -> String {
    let code = body.trim();
    match lang {
        Some(lang) => format!("<pre><code class=\"language-{lang}\">{code}</code></pre>"),
        None => format!("<pre><code>{code}</code></pre>"),
    }
}

/// `replace_all` that ignores matches whose first character follows a backslash.
///
/// A rejected candidate does not consume input: the search resumes one
/// character after its start, so a later unescaped match can still begin
/// inside it.
fn replace_unescaped(
    re: &Regex,
    text: &str,
    mut replacement: impl FnMut(&Captures<'_>) -> String,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;

    while pos <= text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };

        if text[..whole.start()].ends_with('\\') {
            let step = text[whole.start()..].chars().next().map_or(1, char::len_utf8);
            pos = whole.start() + step;
            continue;
        }

        out.push_str(&text[copied..whole.start()]);
        out.push_str(&replacement(&caps));
        copied = whole.end();
        pos = if whole.is_empty() {
            whole.end() + 1
        } else {
            whole.end()
        };
    }

    out.push_str(&text[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_code_span() {
        assert_eq!(markdown_to_telegram_html("`code`"), "<code>code</code>");
    }

    #[test]
    fn fenced_block_keeps_language_and_literal_content() {
        let input = "```python\nprint(1)\n**not bold**\n```";
        assert_eq!(
            markdown_to_telegram_html(input),
            "<pre><code class=\"language-python\">print(1)\n**not bold**</code></pre>"
        );
    }

    #[test]
    fn fenced_block_inner_text_is_trimmed() {
        let input = "Run:\n```python\nprint(1)\n```\nDone.";
        assert_eq!(
            markdown_to_telegram_html(input),
            "Run:\n<pre><code class=\"language-python\">print(1)</code></pre>\nDone."
        );
    }

    #[test]
    fn fence_without_language_has_no_class() {
        assert_eq!(
            markdown_to_telegram_html("```\nlet x = 1;\n```"),
            "<pre><code>let x = 1;</code></pre>"
        );
    }

    #[test]
    fn fence_content_is_escaped_but_not_rewritten() {
        let input = "```html\n<a href='x'>--- # *hi*</a>\n```";
        assert_eq!(
            markdown_to_telegram_html(input),
            "<pre><code class=\"language-html\">&lt;a href=&#39;x&#39;&gt;--- # *hi*&lt;/a&gt;</code></pre>"
        );
    }

    #[test]
    fn inline_code_content_is_not_rewritten() {
        assert_eq!(
            markdown_to_telegram_html("use `a*b*c` and `x---y`"),
            "use <code>a*b*c</code> and <code>x---y</code>"
        );
    }

    #[test]
    fn emphasis_variants() {
        assert_eq!(
            markdown_to_telegram_html("**bold** and *italic* and ~~gone~~"),
            "<strong>bold</strong> and <em>italic</em> and <del>gone</del>"
        );
    }

    #[test]
    fn triple_asterisk_is_bold() {
        assert_eq!(
            markdown_to_telegram_html("***both***"),
            "<strong>both</strong>"
        );
    }

    #[test]
    fn adjacent_spans_do_not_merge() {
        assert_eq!(
            markdown_to_telegram_html("**a** then **b**"),
            "<strong>a</strong> then <strong>b</strong>"
        );
    }

    #[test]
    fn every_header_level_renders_as_blockquote() {
        assert_eq!(
            markdown_to_telegram_html("# Title"),
            "<blockquote>Title</blockquote>"
        );
        assert_eq!(
            markdown_to_telegram_html("## Title"),
            markdown_to_telegram_html("# Title")
        );
        assert_eq!(
            markdown_to_telegram_html("###### Title"),
            "<blockquote>Title</blockquote>"
        );
    }

    #[test]
    fn header_only_matches_at_line_start() {
        assert_eq!(
            markdown_to_telegram_html("intro\n# Heading\nbody #1"),
            "intro\n<blockquote>Heading</blockquote>\nbody #1"
        );
    }

    #[test]
    fn quote_lines_become_blockquotes() {
        assert_eq!(
            markdown_to_telegram_html("> wise words\nplain"),
            "<blockquote>wise words</blockquote>\nplain"
        );
    }

    #[test]
    fn links_become_anchors() {
        assert_eq!(
            markdown_to_telegram_html("see [docs](https://example.com/a)"),
            "see <a href='https://example.com/a'>docs</a>"
        );
    }

    #[test]
    fn horizontal_rules_are_removed_everywhere() {
        assert_eq!(markdown_to_telegram_html("above\n---\nbelow"), "above\n\nbelow");
        assert_eq!(markdown_to_telegram_html("a --- b"), "a  b");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(markdown_to_telegram_html("a<b"), "a&lt;b");
        assert_eq!(
            markdown_to_telegram_html("Tom & Jerry's <tag> x>y"),
            "Tom &amp; Jerry&#39;s &lt;tag&gt; x&gt;y"
        );
    }

    #[test]
    fn escaped_fence_is_not_a_code_block() {
        let out = markdown_to_telegram_html("\\```js\nx\n```");
        assert!(!out.contains("<pre>"), "got: {out}");
        assert!(out.starts_with("\\```js\nx\n"));
    }

    #[test]
    fn escaped_backtick_is_not_inline_code() {
        assert_eq!(
            markdown_to_telegram_html("\\`not code`"),
            "\\`not code`"
        );
    }

    #[test]
    fn escaped_backtick_does_not_hide_later_span() {
        assert_eq!(
            markdown_to_telegram_html("\\` and `real`"),
            "\\` and <code>real</code>"
        );
    }

    #[test]
    fn several_fences_each_restored_in_place() {
        let input = "a\n```rust\nfn a() {}\n```\nb\n```\nplain\n```\nc";
        assert_eq!(
            markdown_to_telegram_html(input),
            "a\n<pre><code class=\"language-rust\">fn a() {}</code></pre>\nb\n<pre><code>plain</code></pre>\nc"
        );
    }

    #[test]
    fn no_placeholder_leaks_into_output() {
        let input = "`x` ```sh\necho hi\n``` **y** `z`";
        let out = markdown_to_telegram_html(input);
        assert!(!out.contains(TOKEN_OPEN));
        assert!(!out.contains(TOKEN_CLOSE));
    }

    #[test]
    fn malformed_input_never_panics() {
        let inputs = [
            "",
            "```",
            "```rust\nfn main() {",
            "**unclosed",
            "*",
            "~~",
            "[label](",
            "#",
            "&gt;",
            "\\",
            "`",
            "\u{E000}\u{E001}",
            "```\n```",
            "émoji 🚀 **bölд** `код`",
        ];
        for input in inputs {
            let _ = markdown_to_telegram_html(input);
        }
    }

    #[test]
    fn unterminated_fence_keeps_code_text() {
        let out = markdown_to_telegram_html("```rust\nfn main() {");
        assert!(out.contains("fn main() {"));
        assert!(!out.contains("<pre>"));
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(
            markdown_to_telegram_html("Hello, world. Nothing to see."),
            "Hello, world. Nothing to see."
        );
    }
}
