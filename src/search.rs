//! Multi-term aggregation on top of a [`Matcher`](crate::matcher::Matcher).
//!
//! A query is split into whitespace-delimited terms, each term is matched
//! on its own, and the per-term results are merged by record identity into
//! one ranked, capped list.

pub mod accumulator;
pub mod aggregator;
pub mod central;

use serde::Serialize;

use crate::matcher::MatchDiagnostic;
use crate::record::{Record, RecordId};

pub use self::accumulator::{ScoreAccumulator, compose_scores};
pub use self::aggregator::{Aggregator, search};
pub use self::central::search_collections;

/// One ranked record in the final result list.
///
/// Borrows the record from the searched collection; nothing is copied or
/// retained past the caller's own lifetime for the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedResult<'a> {
    /// The matched record.
    #[serde(rename = "item")]
    pub record: &'a Record,
    /// Position of the record in the searched collection.
    pub ref_index: usize,
    /// Identity the per-term results were merged under.
    pub id: RecordId,
    /// Composite score; lower is better.
    pub score: f64,
    /// Matched positions from every term, in term order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<MatchDiagnostic>,
    /// Model tag of the result.
    #[serde(rename = "modelName", skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

/// Stable ascending sort by score, then truncation to `limit`.
///
/// Equal scores keep their current relative order.
pub fn rank(results: &mut Vec<AggregatedResult<'_>>, limit: usize) {
    results.sort_by(|a, b| a.score.total_cmp(&b.score));
    results.truncate(limit);
}
