//! Identity-keyed running accumulator for per-term results.

use ahash::AHashMap;

use crate::error::{FuzzyRankError, Result};
use crate::matcher::MatchResult;
use crate::record::{Record, RecordId};
use crate::search::{AggregatedResult, rank};

/// Combine a record's running score with a new term's score.
///
/// Multiplicative, with a zero score on either side standing in as `1.0` so
/// a single degenerate term cannot collapse the product.
pub fn compose_scores(existing: f64, next: f64) -> f64 {
    let existing = if existing == 0.0 { 1.0 } else { existing };
    let next = if next == 0.0 { 1.0 } else { next };
    existing * next
}

/// Merges per-term match results by record identity.
///
/// Entries keep first-insertion order, which is what breaks score ties in
/// [`ScoreAccumulator::into_ranked`].
#[derive(Debug)]
pub struct ScoreAccumulator<'a, 'i> {
    records: &'a [Record],
    ids: &'i [RecordId],
    slots: AHashMap<RecordId, usize>,
    entries: Vec<AggregatedResult<'a>>,
}

impl<'a, 'i> ScoreAccumulator<'a, 'i> {
    /// Create an empty accumulator over `records` and their resolved `ids`.
    pub fn new(records: &'a [Record], ids: &'i [RecordId]) -> Self {
        ScoreAccumulator {
            records,
            ids,
            slots: AHashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Fold one term's results into the accumulator.
    pub fn add_term(&mut self, results: Vec<MatchResult>) -> Result<()> {
        for result in results {
            self.add(result)?;
        }
        Ok(())
    }

    /// Fold one match into the accumulator.
    ///
    /// A record seen before has its score composed and its diagnostics
    /// appended; a new record gets a fresh entry.
    pub fn add(&mut self, result: MatchResult) -> Result<()> {
        let (records, ids) = (self.records, self.ids);
        let (Some(record), Some(id)) = (records.get(result.ref_index), ids.get(result.ref_index))
        else {
            return Err(FuzzyRankError::matcher(format!(
                "match refers to record {} of {}",
                result.ref_index,
                self.records.len()
            )));
        };

        match self.slots.get(id) {
            Some(&slot) => {
                let entry = &mut self.entries[slot];
                entry.score = compose_scores(entry.score, result.score);
                entry.matches.extend(result.matches);
            }
            None => {
                self.slots.insert(id.clone(), self.entries.len());
                self.entries.push(AggregatedResult {
                    record,
                    ref_index: result.ref_index,
                    id: id.clone(),
                    score: result.score,
                    matches: result.matches,
                    model_name: None,
                });
            }
        }

        Ok(())
    }

    /// Number of distinct records accumulated so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sort ascending by composite score (ties in insertion order) and cap.
    pub fn into_ranked(self, limit: usize) -> Vec<AggregatedResult<'a>> {
        let mut entries = self.entries;
        rank(&mut entries, limit);
        entries
    }
}
