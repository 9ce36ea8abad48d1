//! Search-term highlighting.
//!
//! The query is matched literally (regex metacharacters escaped) and
//! case-insensitively.  Highlighting splits text into [`Segment`]s rather than
//! injecting markup, so clearing is just concatenation and always gives back
//! the original text.

use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Compiled matcher for one search query.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Regex,
}

impl Highlighter {
    /// `None` for a blank query: there is nothing to mark.
    pub fn new(query: &str) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .ok()
            .map(|pattern| Self { pattern })
    }

    #[cfg(test)]
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Split `text` into alternating unmatched/matched runs.
    pub fn segments<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let mut out = Vec::new();
        let mut last = 0;
        for m in self.pattern.find_iter(text) {
            if m.start() > last {
                out.push(Segment {
                    text: &text[last..m.start()],
                    matched: false,
                });
            }
            out.push(Segment {
                text: m.as_str(),
                matched: true,
            });
            last = m.end();
        }
        if last < text.len() || out.is_empty() {
            out.push(Segment {
                text: &text[last..],
                matched: false,
            });
        }
        out
    }
}

/// Highlight `text` for an optional highlighter.
pub fn highlight<'a>(highlighter: Option<&Highlighter>, text: &'a str) -> Vec<Segment<'a>> {
    match highlighter {
        Some(h) => h.segments(text),
        None => vec![Segment {
            text,
            matched: false,
        }],
    }
}

/// Drop all marks and return the plain text.
#[cfg(test)]
pub fn clear(segments: &[Segment<'_>]) -> String {
    segments.iter().map(|s| s.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
        segments.iter().filter(|s| s.matched).map(|s| s.text).collect()
    }

    #[test]
    fn blank_query_builds_nothing() {
        assert!(Highlighter::new("").is_none());
        assert!(Highlighter::new("   ").is_none());
    }

    #[test]
    fn matches_every_occurrence_case_insensitively() {
        let h = Highlighter::new("дрон").unwrap();
        let segs = h.segments("Дрон сбит. Ещё один ДРОН замечен, дроны летят");
        assert_eq!(marked(&segs), vec!["Дрон", "ДРОН", "дрон"]);
    }

    #[test]
    fn metacharacters_are_literal() {
        let h = Highlighter::new("a.b (c)").unwrap();
        let segs = h.segments("axb c, a.b (c)!");
        assert_eq!(marked(&segs), vec!["a.b (c)"]);
    }

    #[test]
    fn no_match_yields_single_plain_segment() {
        let h = Highlighter::new("zzz").unwrap();
        let segs = h.segments("hello");
        assert_eq!(segs, vec![Segment { text: "hello", matched: false }]);
        assert!(!h.is_match("hello"));
    }

    #[test]
    fn empty_text_yields_single_empty_segment() {
        let h = Highlighter::new("x").unwrap();
        assert_eq!(h.segments(""), vec![Segment { text: "", matched: false }]);
    }

    #[test]
    fn clear_is_left_inverse_of_highlight() {
        let text = "Missile strike near the port; MISSILE debris found.";
        for query in ["missile", "port", "nothing", "."] {
            let h = Highlighter::new(query);
            let segs = highlight(h.as_ref(), text);
            assert_eq!(clear(&segs), text, "query {query:?}");
        }
    }

    #[test]
    fn without_highlighter_text_is_untouched() {
        let segs = highlight(None, "plain text");
        assert_eq!(segs.len(), 1);
        assert!(!segs[0].matched);
    }

    #[test]
    fn query_is_trimmed() {
        let h = Highlighter::new("  port ").unwrap();
        assert_eq!(marked(&h.segments("sport port")), vec!["port", "port"]);
    }
}
