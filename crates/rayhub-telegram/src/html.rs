// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of rich-text chatter HTML to Telegram's HTML subset.
//!
//! Telegram's `parse_mode=HTML` accepts a handful of inline tags and
//! absolute links; everything else must be stripped and bare `<`, `>`
//! and `&` must be escaped.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Maximum caption length for media messages.
pub const CAPTION_LIMIT: usize = 1024;

/// Inline tags Telegram renders.
const ALLOWED_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "ins", "s", "strike", "del", "code", "pre",
];

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));

static BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(p|div|li|tr|h[1-6])>").expect("valid regex"));

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)([^>]*)>").expect("valid regex"));

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);").expect("valid regex"));

static MANY_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Escapes `&`, `<` and `>` for Telegram HTML text.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Decodes named and numeric character references.
///
/// Unknown named entities are left untouched.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    "ndash" => Some('\u{2013}'),
                    "mdash" => Some('\u{2014}'),
                    "laquo" => Some('\u{ab}'),
                    "raquo" => Some('\u{bb}'),
                    "hellip" => Some('\u{2026}'),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn is_absolute(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}

/// Converts chatter HTML to Telegram HTML.
///
/// Block endings become newlines, allowed inline tags are kept without
/// attributes, absolute links keep only `href`, relative links are reduced
/// to their text, all other tags are dropped. Text is entity-decoded and
/// re-escaped; runs of three or more newlines collapse to two.
pub fn html_to_telegram(html: &str) -> String {
    let text = LINE_BREAK.replace_all(html, "\n");
    let text = BLOCK_END.replace_all(&text, "\n");

    let mut out = String::with_capacity(text.len());
    // One entry per open <a>: whether its closing tag is emitted.
    let mut anchors: Vec<bool> = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(&text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&escape_html(&decode_entities(&text[last..whole.start()])));
        last = whole.end();

        let closing = !caps[1].is_empty();
        let tag = caps[2].to_ascii_lowercase();
        let attrs = &caps[3];

        if tag == "a" {
            if closing {
                if anchors.pop() == Some(true) {
                    out.push_str("</a>");
                }
            } else {
                let href = HREF
                    .captures(attrs)
                    .map(|h| decode_entities(&h[1]))
                    .filter(|h| is_absolute(h));
                match href {
                    Some(href) => {
                        out.push_str(&format!("<a href=\"{}\">", escape_html(&href)));
                        anchors.push(true);
                    }
                    None => anchors.push(false),
                }
            }
        } else if ALLOWED_TAGS.contains(&tag.as_str()) {
            out.push('<');
            if closing {
                out.push('/');
            }
            out.push_str(&tag);
            out.push('>');
        }
    }
    out.push_str(&escape_html(&decode_entities(&text[last..])));

    MANY_NEWLINES.replace_all(&out, "\n\n").trim().to_string()
}

/// Header line identifying the author of a forwarded message.
pub fn author_header(author: &str) -> String {
    format!("💬 <b>{}</b> (Rayhub):", escape_html(author))
}

/// Full text of a forwarded message: header, then the converted body.
pub fn forwarded_text(author: &str, body_html: &str) -> String {
    let header = author_header(author);
    if body_html.is_empty() {
        header
    } else {
        format!("{header}\n{body_html}")
    }
}

/// Truncates to at most [`CAPTION_LIMIT`] characters.
pub fn truncate_caption(text: &str) -> String {
    text.chars().take(CAPTION_LIMIT).collect()
}

/// Body stored in the channel for a message arriving from Telegram.
pub fn inbound_body(from_name: &str, body: &str) -> String {
    let name = from_name.trim();
    let name = if name.is_empty() { "TG" } else { name };
    format!("<b>{}</b>: {}", escape_html(name), escape_html(body.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_tags_become_newlines() {
        assert_eq!(
            html_to_telegram("<p>first</p><p>second<br/>third</p>"),
            "first\nsecond\nthird"
        );
    }

    #[test]
    fn allowed_tags_are_kept_without_attributes() {
        assert_eq!(
            html_to_telegram(r#"<b class="x">bold</b> <EM>it</EM> <span style="c">plain</span>"#),
            "<b>bold</b> <em>it</em> plain"
        );
    }

    #[test]
    fn links_keep_only_absolute_href() {
        assert_eq!(
            html_to_telegram(r#"<a href="https://example.com/a" target="_blank">site</a>"#),
            r#"<a href="https://example.com/a">site</a>"#
        );
        assert_eq!(
            html_to_telegram(r#"see <a href="/web#id=5">record</a>"#),
            "see record"
        );
    }

    #[test]
    fn entities_are_decoded_and_text_re_escaped() {
        assert_eq!(html_to_telegram("a&nbsp;b &#39;q&#39;"), "a\u{a0}b 'q'");
        assert_eq!(html_to_telegram("1 &lt; 2 &amp;&amp; x"), "1 &lt; 2 &amp;&amp; x");
        assert_eq!(html_to_telegram("&#x41;&unknown;"), "A&amp;unknown;");
    }

    #[test]
    fn newline_runs_collapse_and_result_is_trimmed() {
        assert_eq!(
            html_to_telegram("<p>a</p><p></p><p></p><p></p><p>b</p>\n"),
            "a\n\nb"
        );
        assert_eq!(html_to_telegram(""), "");
    }

    #[test]
    fn forwarded_text_has_escaped_header() {
        assert_eq!(
            forwarded_text("Anna <PM>", "hi"),
            "💬 <b>Anna &lt;PM&gt;</b> (Rayhub):\nhi"
        );
        assert_eq!(forwarded_text("Bo", ""), "💬 <b>Bo</b> (Rayhub):");
    }

    #[test]
    fn caption_is_limited_by_characters() {
        let long = "ї".repeat(CAPTION_LIMIT + 10);
        let caption = truncate_caption(&long);
        assert_eq!(caption.chars().count(), CAPTION_LIMIT);
    }

    #[test]
    fn inbound_body_escapes_both_parts() {
        assert_eq!(
            inbound_body("Ivan", "<script>x</script>"),
            "<b>Ivan</b>: &lt;script&gt;x&lt;/script&gt;"
        );
        assert_eq!(inbound_body("  ", "hello "), "<b>TG</b>: hello");
    }
}
