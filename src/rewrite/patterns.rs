//! The four URL shapes scanned in rendered markup.
//!
//! ```text
//! short         "/fr/contact"
//! short+index   "/index.php/fr/contact"
//! absolute      http://fr.example.com/fr/contact"
//! sef query     "/index.php?option=x&lang=fr"
//! ```
//!
//! Each scan only reports matches; deciding replacements is the engine's job.

use std::ops::Range;

use regex::{Captures, Regex};

/// Which scan produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    Short,
    ShortWithIndex,
    Absolute,
    SefQuery,
}

impl UrlShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlShape::Short => "short",
            UrlShape::ShortWithIndex => "short_index",
            UrlShape::Absolute => "absolute",
            UrlShape::SefQuery => "sef_query",
        }
    }
}

/// One match found in a buffer. Borrowed from the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteMatch<'a> {
    pub shape: UrlShape,
    /// Byte range of `full_text` in the scanned buffer.
    pub span: Range<usize>,
    pub full_text: &'a str,
    /// Opening quote. Empty for absolute matches, which start at the scheme.
    pub quote: &'a str,
    pub language_sef: &'a str,
    /// `scheme://host[/path]` before the language segment (absolute only).
    pub authority: &'a str,
    /// Everything after the language segment, or the captured path for SEF-query matches.
    pub path_remainder: &'a str,
    /// `?` or `&` preceding `lang=` (SEF-query only).
    pub separator: &'a str,
    pub closing_quote: &'a str,
}

impl<'a> RewriteMatch<'a> {
    /// Matched text without its quote characters.
    pub fn unquoted(&self) -> String {
        self.full_text.replace(['\'', '"'], "")
    }
}

/// Compiled scans for one language SEF code.
#[derive(Debug, Clone)]
pub struct LanguagePatterns {
    sef: String,
    short: Regex,
    short_with_index: Regex,
    absolute: Regex,
    sef_query: Regex,
}

impl LanguagePatterns {
    pub fn new(sef: &str) -> Result<Self, regex::Error> {
        let escaped = regex::escape(sef);
        Ok(Self {
            sef: sef.to_string(),
            short: Regex::new(&format!(r#"(['"])/({escaped})/([^'"]*)(['"])"#))?,
            short_with_index: Regex::new(&format!(
                r#"(['"])/index\.php/({escaped})/([^'"]*)(['"])"#
            ))?,
            absolute: Regex::new(&format!(
                r#"(https?://[a-zA-Z0-9\-/.]{{5,40}})/({escaped})/([^'"]*)(['"])"#
            ))?,
            sef_query: Regex::new(&format!(r#"(['"])([^'"]+)([?&])lang=({escaped})(['"])"#))?,
        })
    }

    pub fn sef(&self) -> &str {
        &self.sef
    }

    /// Quoted `/<sef>/<rest>` paths.
    pub fn scan_short<'a>(&self, buffer: &'a str) -> Vec<RewriteMatch<'a>> {
        self.short
            .captures_iter(buffer)
            .map(|caps| quoted_match(UrlShape::Short, &caps))
            .collect()
    }

    /// Quoted `/index.php/<sef>/<rest>` paths.
    pub fn scan_short_with_index<'a>(&self, buffer: &'a str) -> Vec<RewriteMatch<'a>> {
        self.short_with_index
            .captures_iter(buffer)
            .map(|caps| quoted_match(UrlShape::ShortWithIndex, &caps))
            .collect()
    }

    /// `http(s)://<host>/<sef>/<rest>` up to the closing quote.
    pub fn scan_absolute<'a>(&self, buffer: &'a str) -> Vec<RewriteMatch<'a>> {
        self.absolute
            .captures_iter(buffer)
            .map(|caps| {
                let whole = group(&caps, 0);
                RewriteMatch {
                    shape: UrlShape::Absolute,
                    span: whole.0,
                    full_text: whole.1,
                    quote: "",
                    authority: group(&caps, 1).1,
                    language_sef: group(&caps, 2).1,
                    path_remainder: group(&caps, 3).1,
                    separator: "",
                    closing_quote: group(&caps, 4).1,
                }
            })
            .collect()
    }

    /// Cheap substring check that gates [`Self::scan_sef_query`].
    pub fn has_sef_query(&self, buffer: &str) -> bool {
        buffer.contains(&format!("?lang={}", self.sef)) || buffer.contains(&format!("&lang={}", self.sef))
    }

    /// Quoted URLs ending in `?lang=<sef>` or `&lang=<sef>`.
    pub fn scan_sef_query<'a>(&self, buffer: &'a str) -> Vec<RewriteMatch<'a>> {
        if !self.has_sef_query(buffer) {
            return Vec::new();
        }

        self.sef_query
            .captures_iter(buffer)
            .map(|caps| {
                let whole = group(&caps, 0);
                RewriteMatch {
                    shape: UrlShape::SefQuery,
                    span: whole.0,
                    full_text: whole.1,
                    quote: group(&caps, 1).1,
                    authority: "",
                    path_remainder: group(&caps, 2).1,
                    separator: group(&caps, 3).1,
                    language_sef: group(&caps, 4).1,
                    closing_quote: group(&caps, 5).1,
                }
            })
            .collect()
    }
}

fn quoted_match<'a>(shape: UrlShape, caps: &Captures<'a>) -> RewriteMatch<'a> {
    let whole = group(caps, 0);
    RewriteMatch {
        shape,
        span: whole.0,
        full_text: whole.1,
        quote: group(caps, 1).1,
        authority: "",
        language_sef: group(caps, 2).1,
        path_remainder: group(caps, 3).1,
        separator: "",
        closing_quote: group(caps, 4).1,
    }
}

fn group<'a>(caps: &Captures<'a>, index: usize) -> (Range<usize>, &'a str) {
    caps.get(index)
        .map(|m| (m.range(), m.as_str()))
        .unwrap_or((0..0, ""))
}

/// Replace each span with its replacement. Spans must be sorted and disjoint.
pub fn splice(buffer: &str, replacements: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(buffer.len());
    let mut cursor = 0;
    for (span, replacement) in replacements {
        out.push_str(&buffer[cursor..span.start]);
        out.push_str(replacement);
        cursor = span.end;
    }
    out.push_str(&buffer[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fr() -> LanguagePatterns {
        LanguagePatterns::new("fr").unwrap()
    }

    #[test]
    fn test_scan_short() {
        let html = r#"<a href="/fr/contact">x</a><a href='/fr/'>y</a><a href="/en/fr/z">z</a>"#;
        let matches = fr().scan_short(html);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].full_text, r#""/fr/contact""#);
        assert_eq!(matches[0].quote, "\"");
        assert_eq!(matches[0].path_remainder, "contact");
        assert_eq!(matches[0].unquoted(), "/fr/contact");
        assert_eq!(&html[matches[0].span.clone()], matches[0].full_text);
        assert_eq!(matches[1].path_remainder, "");
        assert_eq!(matches[1].closing_quote, "'");
    }

    #[test]
    fn test_scan_short_ignores_other_prefixes() {
        let html = r#"<a href="/france/x">x</a><a href="https://a.example.com/fr/x">y</a>"#;
        assert!(fr().scan_short(html).is_empty());
    }

    #[test]
    fn test_scan_short_with_index() {
        let html = r#"<a href="/index.php/fr/shop/cart">x</a><a href="/indexXphp/fr/no">n</a>"#;
        let matches = fr().scan_short_with_index(html);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].path_remainder, "shop/cart");
        assert_eq!(matches[0].language_sef, "fr");
    }

    #[test]
    fn test_scan_absolute() {
        let html = r#"<a href="http://m.fr.example.com/fr/about?x=1">x</a>"#;
        let matches = fr().scan_absolute(html);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].full_text, r#"http://m.fr.example.com/fr/about?x=1""#);
        assert_eq!(matches[0].authority, "http://m.fr.example.com");
        assert_eq!(matches[0].path_remainder, "about?x=1");
        assert_eq!(matches[0].closing_quote, "\"");
        assert_eq!(matches[0].quote, "");
    }

    #[test]
    fn test_scan_absolute_with_index_segment() {
        let html = r#"<a href="https://fr.example.com/index.php/fr/a">x</a>"#;
        let matches = fr().scan_absolute(html);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].authority, "https://fr.example.com/index.php");
        assert_eq!(matches[0].path_remainder, "a");
    }

    #[test]
    fn test_scan_sef_query() {
        let html = r#"<a href="/index.php?view=list&lang=fr">x</a><a href="/p?lang=fr">y</a><a href="/p?lang=fra">z</a>"#;
        let patterns = fr();
        assert!(patterns.has_sef_query(html));

        let matches = patterns.scan_sef_query(html);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].path_remainder, "/index.php?view=list");
        assert_eq!(matches[0].separator, "&");
        assert_eq!(matches[1].path_remainder, "/p");
        assert_eq!(matches[1].separator, "?");
    }

    #[test]
    fn test_scan_sef_query_precheck() {
        let patterns = fr();
        assert!(!patterns.has_sef_query(r#"<a href="/p?lang=en">x</a>"#));
        assert!(patterns.scan_sef_query(r#"<a href="/p?lang=en">x</a>"#).is_empty());
    }

    #[test]
    fn test_sef_is_escaped() {
        let patterns = LanguagePatterns::new("a.b").unwrap();
        assert!(patterns.scan_short(r#""/aXb/x""#).is_empty());
        assert_eq!(patterns.scan_short(r#""/a.b/x""#).len(), 1);
    }

    #[test]
    fn test_splice() {
        let out = splice("aXbXc", &[(1..2, "1".into()), (3..4, "22".into())]);
        assert_eq!(out, "a1b22c");
        assert_eq!(splice("abc", &[]), "abc");
    }
}
