//! Central search across several models at once.
//!
//! Every [`RecordSet`] is normalized and searched on its own, with fields
//! discovered from its own first record. Results are tagged with the set's
//! model and merged into one list ranked by score. Identity is scoped to a
//! set: records of different models are never merged with each other.

use crate::error::Result;
use crate::query::normalizer::{QueryNormalizer, SearchRequest};
use crate::record::RecordSet;
use crate::search::aggregator::Aggregator;
use crate::search::{AggregatedResult, rank};

/// Search every set for `request` and merge the results.
///
/// Sets are visited in order, so equal scores rank the earlier set first.
pub fn search_collections<'a>(
    aggregator: &Aggregator,
    sets: &'a [RecordSet],
    request: &SearchRequest,
    normalizer: &QueryNormalizer,
) -> Result<Vec<AggregatedResult<'a>>> {
    let limit = normalizer.limit_for(request);
    let mut merged = Vec::new();

    for set in sets {
        if set.is_empty() {
            log::debug!("model {} has no records, skipping", set.model);
            continue;
        }

        let mut results = aggregator.search_request(&set.records, request, normalizer)?;
        log::debug!("model {} contributed {} results", set.model, results.len());

        for result in &mut results {
            result.model_name = Some(set.model.clone());
        }
        merged.append(&mut results);
    }

    rank(&mut merged, limit);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    fn sets() -> Vec<RecordSet> {
        vec![
            RecordSet::new(
                "Hotel",
                vec![
                    Record::from_value(json!({"id": 1, "name": "Alpine Lodge"})).unwrap(),
                    Record::from_value(json!({"id": 2, "name": "Harbor Inn"})).unwrap(),
                ],
            ),
            RecordSet::new("Empty", Vec::new()),
            RecordSet::new(
                "Resort",
                vec![
                    Record::from_value(json!({"id": 1, "title": "Alpine Ridge Resort"})).unwrap(),
                ],
            ),
        ]
    }

    #[test]
    fn test_merges_across_models() {
        let sets = sets();
        let results = search_collections(
            &Aggregator::default(),
            &sets,
            &SearchRequest::new("alpine"),
            &QueryNormalizer::default(),
        )
        .unwrap();

        let tagged: Vec<_> = results
            .iter()
            .map(|r| (r.model_name.as_deref(), r.ref_index))
            .collect();
        // Same id in two models: kept apart, equal scores in set order.
        assert_eq!(tagged, vec![(Some("Hotel"), 0), (Some("Resort"), 0)]);
    }

    #[test]
    fn test_limit_applies_to_merged_list() {
        let sets = sets();
        let results = search_collections(
            &Aggregator::default(),
            &sets,
            &SearchRequest::new("alpine").limit("1"),
            &QueryNormalizer::default(),
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].model_name.as_deref(), Some("Hotel"));
    }

    #[test]
    fn test_no_sets() {
        let results = search_collections(
            &Aggregator::default(),
            &[],
            &SearchRequest::new("alpine"),
            &QueryNormalizer::default(),
        )
        .unwrap();
        assert!(results.is_empty());
    }
}
