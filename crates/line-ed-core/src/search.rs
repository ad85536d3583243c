/// Line matching for buffer searches: plain text, regex, and whole-word patterns.
use anyhow::{Context, Result};
use regex::Regex;

/// Which way a search scans from the cursor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Increasing line numbers.
    Down,
    /// Decreasing line numbers.
    Up,
}

impl Direction {
    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
        }
    }
}

/// Decides whether a single line matches.
pub trait LineMatcher {
    fn is_match(&self, line: &str) -> bool;
}

impl LineMatcher for Regex {
    fn is_match(&self, line: &str) -> bool {
        Regex::is_match(self, line)
    }
}

/// Plain substring match.
impl LineMatcher for str {
    fn is_match(&self, line: &str) -> bool {
        line.contains(self)
    }
}

/// Search configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// The search query string.
    pub query: String,
    /// Treat the query as a regular expression instead of literal text.
    pub use_regex: bool,
    pub case_sensitive: bool,
    /// Only match the query as a whole word.
    pub whole_word: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            use_regex: true,
            case_sensitive: true,
            whole_word: false,
        }
    }
}

impl SearchOptions {
    /// Returns a copy of these options searching for `query`.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..self.clone()
        }
    }
}

/// A compiled search pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles the query in `options` into a pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting regex is invalid.
    pub fn compile(options: &SearchOptions) -> Result<Self> {
        let mut pattern = if options.use_regex {
            options.query.clone()
        } else {
            regex::escape(&options.query)
        };

        if options.whole_word {
            pattern = format!(r"\b(?:{pattern})\b");
        }
        if !options.case_sensitive {
            pattern = format!("(?i){pattern}");
        }

        let regex = Regex::new(&pattern).context("invalid search pattern")?;
        Ok(Self { regex })
    }

    /// The regex source this pattern was compiled to.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl LineMatcher for Pattern {
    fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(query: &str, tweak: impl FnOnce(&mut SearchOptions)) -> Pattern {
        let mut options = SearchOptions::default().with_query(query);
        tweak(&mut options);
        Pattern::compile(&options).unwrap()
    }

    #[test]
    fn test_default_options_are_regex_case_sensitive() {
        let options = SearchOptions::default();
        assert!(options.use_regex);
        assert!(options.case_sensitive);
        assert!(!options.whole_word);
    }

    #[test]
    fn test_regex_pattern() {
        let pattern = compile(r"^line \d+$", |_| {});
        assert!(pattern.is_match("line 42"));
        assert!(!pattern.is_match("a line 42"));
    }

    #[test]
    fn test_literal_pattern_escapes_metachars() {
        let pattern = compile("a.b", |o| o.use_regex = false);
        assert!(pattern.is_match("xa.by"));
        assert!(!pattern.is_match("axb"));
    }

    #[test]
    fn test_case_insensitive() {
        let pattern = compile("wally", |o| o.case_sensitive = false);
        assert!(pattern.is_match("Where is WALLY?"));
        let strict = compile("wally", |_| {});
        assert!(!strict.is_match("Wally"));
    }

    #[test]
    fn test_whole_word() {
        let pattern = compile("cat|dog", |o| o.whole_word = true);
        assert!(pattern.is_match("a dog barks"));
        assert!(!pattern.is_match("hotdogs"));
        assert!(!pattern.is_match("concatenate"));
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let options = SearchOptions::default().with_query("(unclosed");
        let err = Pattern::compile(&options).unwrap_err();
        assert!(err.to_string().contains("invalid search pattern"));
    }

    #[test]
    fn test_invalid_regex_ok_when_literal() {
        let pattern = compile("(unclosed", |o| o.use_regex = false);
        assert!(pattern.is_match("f(unclosed"));
    }

    #[test]
    fn test_str_matcher_is_substring() {
        assert!(LineMatcher::is_match("ll", "hello"));
        assert!(!LineMatcher::is_match("LL", "hello"));
    }

    #[test]
    fn test_regex_matcher() {
        let re = Regex::new(r"\d").unwrap();
        assert!(LineMatcher::is_match(&re, "a1"));
        assert!(!LineMatcher::is_match(&re, "ab"));
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Down.opposite(), Direction::Up);
        assert_eq!(Direction::Up.opposite(), Direction::Down);
    }
}
