//! Topic pattern compilation and matching.

use regex::Regex;
use std::fmt;

/// Separator between topic segments. `*` never crosses it.
pub const SEGMENT_SEPARATOR: char = '/';

const SINGLE_SEGMENT: char = '*';
const MULTI_SEGMENT: char = '#';

/// A subscription key matched against concrete topics.
///
/// Patterns without wildcards compare by string equality. Patterns with
/// wildcards are compiled once into an anchored regex.
#[derive(Debug, Clone)]
pub struct TopicPattern {
    raw: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact,
    Wildcard(Regex),
}

impl TopicPattern {
    /// Compile a pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        if !raw.contains([SINGLE_SEGMENT, MULTI_SEGMENT]) {
            return Self {
                raw,
                matcher: Matcher::Exact,
            };
        }

        let source = wildcard_to_regex(&raw);
        let matcher = match Regex::new(&source) {
            Ok(regex) => Matcher::Wildcard(regex),
            Err(e) => {
                // Only reachable when the pattern exceeds the regex size limit.
                tracing::warn!(pattern = %raw, error = %e, "Falling back to exact topic match");
                Matcher::Exact
            }
        };
        Self { raw, matcher }
    }

    /// Check whether `topic` matches this pattern.
    pub fn matches(&self, topic: &str) -> bool {
        match &self.matcher {
            Matcher::Exact => self.raw == topic,
            Matcher::Wildcard(regex) => regex.is_match(topic),
        }
    }

    /// The pattern as it was subscribed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern contains any wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.matcher, Matcher::Wildcard(_))
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Translate a wildcard pattern into an anchored regex source string.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str("(?s)^");
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            SINGLE_SEGMENT => {
                source.push_str("[^");
                source.push_str(&regex::escape(SEGMENT_SEPARATOR.encode_utf8(&mut buf)));
                source.push_str("]+");
            }
            MULTI_SEGMENT => source.push_str(".*"),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    source.push('$');
    source
}
