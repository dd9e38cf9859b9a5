//! Escaped markup fragments.
//!
//! [`Markup`] can only grow through methods that escape their input or append
//! fixed tags, so text that reaches the output has been escaped exactly once.
//! Line breaks are a separate call and never pass through the escaper.

use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;
use url::Url;

/// A fragment of ENML/XML that is safe to embed as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Escaped text.
    pub fn text(text: &str) -> Self {
        let mut m = Self::new();
        m.push_text(text);
        m
    }

    pub fn push_text(&mut self, text: &str) {
        self.0.push_str(&escape(text));
    }

    /// Escaped text with URLs and e-mail addresses wrapped in `<a>` tags.
    pub fn push_linkified(&mut self, text: &str) {
        let mut cursor = 0;
        for link in find_links(text) {
            self.push_text(&text[cursor..link.range.start]);
            self.push_link(&link.href, &text[link.range.clone()]);
            cursor = link.range.end;
        }
        self.push_text(&text[cursor..]);
    }

    /// Linkified text where every `\n` becomes `<br/>` followed by a newline.
    pub fn push_paragraphs(&mut self, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.line_break();
            }
            self.push_linkified(line);
        }
    }

    pub fn line_break(&mut self) {
        self.0.push_str("<br/>\n");
    }

    pub fn push_link(&mut self, href: &str, label: &str) {
        self.0.push_str("<a href=\"");
        self.push_text(href);
        self.0.push_str("\">");
        self.push_text(label);
        self.0.push_str("</a>");
    }

    /// `<tag>` + children + `</tag>`, for fixed tag names only.
    pub fn push_element(&mut self, tag: &'static str, children: &Markup) {
        self.0.push('<');
        self.0.push_str(tag);
        self.0.push('>');
        self.0.push_str(&children.0);
        self.0.push_str("</");
        self.0.push_str(tag);
        self.0.push('>');
    }

    /// A self-closing element with escaped attribute values.
    pub fn push_empty_element(&mut self, tag: &'static str, attrs: &[(&'static str, &str)]) {
        self.0.push('<');
        self.0.push_str(tag);
        for (name, value) in attrs {
            self.0.push(' ');
            self.0.push_str(name);
            self.0.push_str("=\"");
            self.push_text(value);
            self.0.push('"');
        }
        self.0.push_str("/>");
    }

    pub fn append(&mut self, other: &Markup) {
        self.0.push_str(&other.0);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Escape `& < > " '` and drop characters XML 1.0 cannot carry at all.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text
        .chars()
        .any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'') || is_forbidden(c))
    {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c if is_forbidden(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

// ---------------------------------------------------------------------------
// Link detection
// ---------------------------------------------------------------------------

// URL bodies stop at CJK ideographs, kana, hangul and full-width punctuation,
// which are written without a separating space.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:(?:https?|ftp)://|www\.)[^\s<>"\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}\x{3000}-\x{303F}\x{FF00}-\x{FFEF}]+|[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}"#,
    )
    .expect("link pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Byte range of the link text within the searched string.
    pub range: Range<usize>,
    pub href: String,
}

/// URLs (`http`, `https`, `ftp`, bare `www.`) and e-mail addresses in `text`.
pub fn find_links(text: &str) -> Vec<Link> {
    LINK_RE
        .find_iter(text)
        .filter(|m| !touches_ascii_word(text, m.start(), m.end()))
        .filter_map(|m| {
            let candidate = trim_trailing_punctuation(m.as_str());
            let href = href_for(candidate)?;
            Some(Link {
                range: m.start()..m.start() + candidate.len(),
                href,
            })
        })
        .collect()
}

/// A candidate glued to ASCII letters or digits is part of a longer word.
fn touches_ascii_word(text: &str, start: usize, end: usize) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    text[..start].chars().next_back().is_some_and(is_word)
        || text[end..].chars().next().is_some_and(is_word)
}

fn trim_trailing_punctuation(candidate: &str) -> &str {
    let mut s = candidate;
    while let Some(last) = s.chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '*' => true,
            ')' => s.matches('(').count() < s.matches(')').count(),
            ']' => s.matches('[').count() < s.matches(']').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        s = &s[..s.len() - last.len_utf8()];
    }
    s
}

fn href_for(link: &str) -> Option<String> {
    let href = if link.contains("://") {
        link.to_string()
    } else if link.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("www.")) {
        format!("http://{}", link)
    } else if link.contains('@') {
        format!("mailto:{}", link)
    } else {
        return None;
    };

    let url = Url::parse(&href).ok()?;
    if url.scheme() == "mailto" {
        return Some(href);
    }
    match url.host_str() {
        Some(host) if host.contains('.') || host == "localhost" => Some(href),
        _ => None,
    }
}
