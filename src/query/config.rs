//! Search configuration shared by the normalizer, matcher and aggregator.

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyRankError, Result};

/// Similarity threshold used when the caller supplies none.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Result cap used when the caller supplies none (or an unusable one).
pub const DEFAULT_LIMIT: usize = 100;

/// Weight given to discovered fields without an explicit override.
pub const DEFAULT_WEIGHT: f64 = 0.1;

/// Shortest run of matched characters that counts as a match.
pub const DEFAULT_MIN_MATCH_CHAR_LENGTH: usize = 3;

/// Identity field used to merge per-term results.
pub const DEFAULT_IDENTITY_FIELD: &str = "id";

/// A field to match against, with its relative importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchField {
    /// Field name.
    pub name: String,
    /// Strictly positive weight; higher means more important.
    pub weight: f64,
}

impl SearchField {
    /// Create a field with the default weight.
    pub fn new<S: Into<String>>(name: S) -> Self {
        SearchField {
            name: name.into(),
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Create a field with an explicit weight.
    pub fn weighted<S: Into<String>>(name: S, weight: f64) -> Self {
        SearchField {
            name: name.into(),
            weight,
        }
    }
}

/// Configuration for one search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Fields to match against. Empty means "discover from the first record".
    pub fields: Vec<SearchField>,
    /// Similarity threshold in `[0, 1]`; looser as it grows.
    pub threshold: f64,
    /// Maximum number of results returned.
    pub limit: usize,
    /// Per-term candidate cap on the aggregated path. `None` keeps every
    /// candidate until after the merge.
    pub term_limit: Option<usize>,
    /// Shortest run of matched characters that counts as a match.
    pub min_match_char_length: usize,
    /// Report matched positions with each result.
    pub include_matches: bool,
    /// Ask the matcher to sort its own output by score.
    pub should_sort: bool,
    /// Report every matching element of array fields, not just the matched field.
    pub find_all_matches: bool,
    /// Interpret `=`, `'`, `^`, `$` and `!` operators in terms.
    pub use_extended_search: bool,
    /// Field holding the record identity.
    pub identity_field: String,
    /// Route single-term queries through the accumulator as well.
    pub always_aggregate: bool,
    /// Run per-term matcher calls on the rayon pool.
    pub parallel_terms: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            fields: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_LIMIT,
            term_limit: None,
            min_match_char_length: DEFAULT_MIN_MATCH_CHAR_LENGTH,
            include_matches: true,
            should_sort: true,
            find_all_matches: false,
            use_extended_search: false,
            identity_field: DEFAULT_IDENTITY_FIELD.to_string(),
            always_aggregate: false,
            parallel_terms: true,
        }
    }
}

impl SearchConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        SearchConfig::default()
    }

    /// Set the fields to match against.
    pub fn fields(mut self, fields: Vec<SearchField>) -> Self {
        self.fields = fields;
        self
    }

    /// Match against the named fields with the default weight.
    pub fn field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = names.into_iter().map(SearchField::new).collect();
        self
    }

    /// Set the similarity threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the result cap.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the per-term candidate cap.
    pub fn term_limit(mut self, term_limit: usize) -> Self {
        self.term_limit = Some(term_limit);
        self
    }

    /// Set the minimum matched run length.
    pub fn min_match_char_length(mut self, length: usize) -> Self {
        self.min_match_char_length = length;
        self
    }

    /// Report matched positions.
    pub fn include_matches(mut self, include_matches: bool) -> Self {
        self.include_matches = include_matches;
        self
    }

    /// Report every matching array element.
    pub fn find_all_matches(mut self, find_all_matches: bool) -> Self {
        self.find_all_matches = find_all_matches;
        self
    }

    /// Enable extended query syntax.
    pub fn use_extended_search(mut self, use_extended_search: bool) -> Self {
        self.use_extended_search = use_extended_search;
        self
    }

    /// Set the identity field.
    pub fn identity_field<S: Into<String>>(mut self, identity_field: S) -> Self {
        self.identity_field = identity_field.into();
        self
    }

    /// Force the aggregated path for single-term queries.
    pub fn always_aggregate(mut self, always_aggregate: bool) -> Self {
        self.always_aggregate = always_aggregate;
        self
    }

    /// Enable or disable parallel per-term matching.
    pub fn parallel_terms(mut self, parallel_terms: bool) -> Self {
        self.parallel_terms = parallel_terms;
        self
    }

    /// Check the invariants the matcher relies on.
    ///
    /// Out-of-range numbers are the normalizer's job; a configuration that
    /// reaches this point with one is a caller bug.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(FuzzyRankError::configuration(
                "no fields to search and no sample record to discover them from",
            ));
        }
        if let Some(field) = self
            .fields
            .iter()
            .find(|f| !(f.weight.is_finite() && f.weight > 0.0))
        {
            return Err(FuzzyRankError::configuration(format!(
                "field '{}' has non-positive weight {}",
                field.name, field.weight
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(FuzzyRankError::configuration(format!(
                "threshold {} is outside [0, 1]",
                self.threshold
            )));
        }
        if self.identity_field.is_empty() {
            return Err(FuzzyRankError::configuration("identity field name is empty"));
        }
        Ok(())
    }

    /// Whether limit and threshold are already usable as they are.
    pub fn is_in_range(&self) -> bool {
        self.limit >= 1
            && self.term_limit != Some(0)
            && self.threshold.is_finite()
            && (0.0..=1.0).contains(&self.threshold)
    }

    /// Replace an unusable limit or threshold with its fallback.
    ///
    /// A zero limit becomes [`DEFAULT_LIMIT`] and a zero term limit is
    /// dropped. A negative or non-finite threshold becomes
    /// [`DEFAULT_THRESHOLD`]; one above `1` is clamped to `1`.
    pub fn clamp_to_range(&mut self) {
        if self.limit == 0 {
            log::warn!("limit 0 is unusable, falling back to {DEFAULT_LIMIT}");
            self.limit = DEFAULT_LIMIT;
        }
        if self.term_limit == Some(0) {
            log::warn!("term limit 0 is unusable, ignoring it");
            self.term_limit = None;
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            log::warn!(
                "threshold {} is unusable, falling back to {DEFAULT_THRESHOLD}",
                self.threshold
            );
            self.threshold = DEFAULT_THRESHOLD;
        } else if self.threshold > 1.0 {
            self.threshold = 1.0;
        }
    }

    /// Sum of all field weights.
    pub fn total_weight(&self) -> f64 {
        self.fields.iter().map(|f| f.weight).sum()
    }
}
