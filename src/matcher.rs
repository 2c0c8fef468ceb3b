//! The approximate matching capability consumed by the aggregator.
//!
//! A [`Matcher`] scores records against a single query term. Scores live in
//! `[0, 1]`, where `0.0` is an exact match and larger is weaker; records that
//! do not match are omitted. The aggregator treats the matcher as a black
//! box and only orchestrates calls to it, so any implementation can be
//! plugged in. [`ApproximateMatcher`] is the one shipped with the crate.

pub mod approximate;
pub mod pattern;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::config::SearchConfig;
use crate::record::Record;

pub use self::approximate::ApproximateMatcher;
pub use self::pattern::{Pattern, PatternKind};

/// Trait for scoring records against one query term.
///
/// Implementations must be pure functions of their inputs: the aggregator may
/// call them concurrently for different terms of the same query.
pub trait Matcher: Send + Sync + Debug {
    /// Score `records` against `term`.
    ///
    /// Returns at most `limit` results, each pointing back at its record
    /// through [`MatchResult::ref_index`].
    fn search(
        &self,
        records: &[Record],
        term: &str,
        config: &SearchConfig,
        limit: usize,
    ) -> Result<Vec<MatchResult>>;
}

/// One record matched by one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Position of the record in the searched collection.
    pub ref_index: usize,
    /// Match score; `0.0` is exact, larger is weaker.
    pub score: f64,
    /// Where the term matched, when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<MatchDiagnostic>,
}

/// Where a term matched inside one field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDiagnostic {
    /// Field name.
    pub key: String,
    /// The matched field value.
    pub value: String,
    /// Element index when the field holds an array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_index: Option<usize>,
    /// Matched character ranges, inclusive on both ends.
    pub indices: Vec<(usize, usize)>,
}
