//! Term patterns, including the extended query syntax.
//!
//! With extended search enabled a term may carry an operator:
//!
//! | Term       | Kind          | Matches values that                 |
//! |------------|---------------|-------------------------------------|
//! | `jscript`  | `Fuzzy`       | approximately contain `jscript`     |
//! | `=scheme`  | `Exact`       | are exactly `scheme`                |
//! | `'python`  | `Include`     | contain `python`                    |
//! | `^java`    | `Prefix`      | start with `java`                   |
//! | `.js$`     | `Suffix`      | end with `.js`                      |
//! | `!ruby`    | `NotInclude`  | do not contain `ruby`               |
//! | `!^go`     | `NotPrefix`   | do not start with `go`              |
//! | `!.md$`    | `NotSuffix`   | do not end with `.md`               |
//!
//! All comparisons are case-insensitive. Reported indices are char offsets
//! into the original field value.

use serde::{Deserialize, Serialize};

use crate::util::levenshtein::substring_alignment;

/// How a term is compared against field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    Fuzzy,
    Exact,
    Include,
    Prefix,
    Suffix,
    NotInclude,
    NotPrefix,
    NotSuffix,
}

impl PatternKind {
    /// Inverse kinds match records where *no* field satisfies the text.
    pub fn is_inverse(self) -> bool {
        matches!(
            self,
            PatternKind::NotInclude | PatternKind::NotPrefix | PatternKind::NotSuffix
        )
    }
}

/// A parsed, lowercased term.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    kind: PatternKind,
    chars: Vec<char>,
}

/// Outcome of comparing a pattern with one field value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    /// Score in `[0, 1]`, `0.0` for exact.
    pub score: f64,
    /// Matched character ranges, inclusive.
    pub indices: Vec<(usize, usize)>,
}

impl Pattern {
    /// A plain fuzzy pattern.
    pub fn fuzzy(term: &str) -> Self {
        Pattern {
            kind: PatternKind::Fuzzy,
            chars: lowercase_chars(term),
        }
    }

    /// Parse `term`, honoring operators only when `extended` is set.
    ///
    /// An operator with nothing left to match falls back to a fuzzy match on
    /// the whole term.
    pub fn parse(term: &str, extended: bool) -> Self {
        if !extended {
            return Pattern::fuzzy(term);
        }

        let (kind, text) = if let Some(rest) = term.strip_prefix("!^") {
            (PatternKind::NotPrefix, rest)
        } else if let Some(rest) = term.strip_prefix('!') {
            match rest.strip_suffix('$') {
                Some(inner) => (PatternKind::NotSuffix, inner),
                None => (PatternKind::NotInclude, rest),
            }
        } else if let Some(rest) = term.strip_prefix('=') {
            (PatternKind::Exact, rest)
        } else if let Some(rest) = term.strip_prefix('\'') {
            (PatternKind::Include, rest)
        } else if let Some(rest) = term.strip_prefix('^') {
            (PatternKind::Prefix, rest)
        } else if let Some(rest) = term.strip_suffix('$') {
            (PatternKind::Suffix, rest)
        } else {
            (PatternKind::Fuzzy, term)
        };

        if text.is_empty() {
            return Pattern::fuzzy(term);
        }

        Pattern {
            kind,
            chars: lowercase_chars(text),
        }
    }

    /// The pattern kind.
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Number of characters in the pattern text.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the pattern text is empty.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Compare against one field value.
    ///
    /// `threshold` bounds the fuzzy score; `min_run` is the shortest run of
    /// matched characters a fuzzy match must contain (capped at the pattern
    /// length).
    pub fn match_text(&self, text: &str, threshold: f64, min_run: usize) -> Option<FieldMatch> {
        let text = lowercase_chars(text);
        let len = self.chars.len();
        if len == 0 {
            return None;
        }

        let exact = |indices| {
            Some(FieldMatch {
                score: 0.0,
                indices,
            })
        };
        let inverse = |found: bool| {
            (!found).then(|| FieldMatch {
                score: 0.0,
                indices: Vec::new(),
            })
        };

        match self.kind {
            PatternKind::Fuzzy => self.match_fuzzy(&text, threshold, min_run),
            PatternKind::Exact => {
                if text == self.chars {
                    exact(vec![(0, len - 1)])
                } else {
                    None
                }
            }
            PatternKind::Include => {
                find_chars(&text, &self.chars).and_then(|at| exact(vec![(at, at + len - 1)]))
            }
            PatternKind::Prefix => {
                if text.starts_with(&self.chars) {
                    exact(vec![(0, len - 1)])
                } else {
                    None
                }
            }
            PatternKind::Suffix => {
                if text.ends_with(&self.chars) {
                    let at = text.len() - len;
                    exact(vec![(at, at + len - 1)])
                } else {
                    None
                }
            }
            PatternKind::NotInclude => inverse(find_chars(&text, &self.chars).is_some()),
            PatternKind::NotPrefix => inverse(text.starts_with(&self.chars)),
            PatternKind::NotSuffix => inverse(text.ends_with(&self.chars)),
        }
    }

    fn match_fuzzy(&self, text: &[char], threshold: f64, min_run: usize) -> Option<FieldMatch> {
        let len = self.chars.len();
        let max_errors = (threshold * len as f64).floor() as usize;
        let alignment = substring_alignment(&self.chars, text, max_errors)?;

        let score = alignment.errors as f64 / len as f64;
        if score > threshold {
            return None;
        }

        let required = min_run.clamp(1, len);
        let indices: Vec<(usize, usize)> = alignment
            .match_runs()
            .into_iter()
            .filter(|(start, end)| end - start + 1 >= required)
            .collect();

        if indices.is_empty() {
            return None;
        }

        Some(FieldMatch { score, indices })
    }
}

/// Lowercase one char per char so positions line up with the input.
///
/// Chars whose lowercase form expands to several chars are kept as-is.
fn lowercase_chars(s: &str) -> Vec<char> {
    s.chars()
        .map(|c| {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) => l,
                _ => c,
            }
        })
        .collect()
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
