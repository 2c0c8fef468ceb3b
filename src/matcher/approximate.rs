//! Default matcher: approximate substring matching over weighted fields.
//!
//! Each configured field is compared with the term independently. A field's
//! score is the error rate of the best approximate occurrence of the term in
//! the field value. A record's score combines its matched fields
//! multiplicatively, each raised to the field's share of the total weight, so
//! heavier fields pull the score further towards their own. Location inside
//! the field and field length play no part.

use std::cmp::Ordering;

use crate::error::Result;
use crate::matcher::pattern::{FieldMatch, Pattern};
use crate::matcher::{MatchDiagnostic, MatchResult, Matcher};
use crate::query::config::SearchConfig;
use crate::record::Record;

/// Stand-in for an exact field score so that weighting still applies.
const EXACT_SCORE: f64 = f64::EPSILON;

/// Matcher backed by Levenshtein substring alignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMatcher;

impl ApproximateMatcher {
    /// Create a new matcher.
    pub fn new() -> Self {
        ApproximateMatcher
    }

    /// Score one record. `None` when no field matched.
    fn score_record(
        &self,
        record: &Record,
        pattern: &Pattern,
        config: &SearchConfig,
        total_weight: f64,
    ) -> Option<(f64, Vec<MatchDiagnostic>)> {
        let inverse = pattern.kind().is_inverse();
        let mut total = 1.0;
        let mut matched_any = false;
        let mut diagnostics = Vec::new();

        for field in &config.fields {
            let values = record.searchable_values(&field.name);
            if values.is_empty() {
                continue;
            }

            let mut best: Option<FieldMatch> = None;
            let mut field_diagnostics = Vec::new();
            let mut violated = false;

            for value in values {
                let found = pattern.match_text(
                    &value.text,
                    config.threshold,
                    config.min_match_char_length,
                );

                let Some(found) = found else {
                    violated = true;
                    continue;
                };

                if config.include_matches {
                    let diagnostic = MatchDiagnostic {
                        key: field.name.clone(),
                        value: value.text.clone(),
                        array_index: value.array_index,
                        indices: found.indices.clone(),
                    };
                    let better = best.as_ref().is_none_or(|b| found.score < b.score);
                    if config.find_all_matches {
                        field_diagnostics.push(diagnostic);
                    } else if better {
                        field_diagnostics = vec![diagnostic];
                    }
                }

                if best.as_ref().is_none_or(|b| found.score < b.score) {
                    best = Some(found);
                }
            }

            // Inverse patterns require every value of every field to pass.
            if inverse && violated {
                return None;
            }

            if let Some(best) = best {
                let score = if best.score == 0.0 {
                    EXACT_SCORE
                } else {
                    best.score
                };
                total *= score.powf(field.weight / total_weight);
                matched_any = true;
                diagnostics.extend(field_diagnostics);
            }
        }

        matched_any.then_some((total, diagnostics))
    }
}

impl Matcher for ApproximateMatcher {
    fn search(
        &self,
        records: &[Record],
        term: &str,
        config: &SearchConfig,
        limit: usize,
    ) -> Result<Vec<MatchResult>> {
        let pattern = Pattern::parse(term, config.use_extended_search);
        if pattern.is_empty() || records.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let total_weight = config.total_weight();

        let mut results: Vec<MatchResult> = records
            .iter()
            .enumerate()
            .filter_map(|(ref_index, record)| {
                self.score_record(record, &pattern, config, total_weight)
                    .map(|(score, matches)| MatchResult {
                        ref_index,
                        score,
                        matches,
                    })
            })
            .collect();

        log::trace!(
            "term {:?} ({:?}) matched {} of {} records",
            term,
            pattern.kind(),
            results.len(),
            records.len()
        );

        if config.should_sort {
            // Stable: equal scores keep record order.
            results.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
        }
        results.truncate(limit);

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::config::SearchField;
    use serde_json::json;

    fn records() -> Vec<Record> {
        vec![
            Record::from_value(json!({"id": 1, "name": "Alpine Ridge", "city": "Denver"})).unwrap(),
            Record::from_value(json!({"id": 2, "name": "Alpine Lodge", "city": "Aspen"})).unwrap(),
            Record::from_value(json!({"id": 3, "name": "Coastal View", "city": "Malibu"})).unwrap(),
        ]
    }

    #[test]
    fn test_single_field_exact() {
        let config = SearchConfig::new().field_names(["name"]);
        let results = ApproximateMatcher::new()
            .search(&records(), "alpine", &config, 10)
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.ref_index).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(results.iter().all(|r| r.score == EXACT_SCORE));
        assert!(results.iter().all(|r| r.matches.len() == 1));

        let config = config.include_matches(false);
        let results = ApproximateMatcher::new()
            .search(&records(), "alpine", &config, 10)
            .unwrap();
        assert!(results.iter().all(|r| r.matches.is_empty()));
    }

    #[test]
    fn test_location_and_length_do_not_score() {
        let records = vec![
            Record::from_value(json!({"id": 1, "name": "Lodge"})).unwrap(),
            Record::from_value(json!({
                "id": 2,
                "name": "A long road up the valley ends at the old Lodge"
            }))
            .unwrap(),
        ];
        let config = SearchConfig::new().field_names(["name"]);
        let results = ApproximateMatcher::new()
            .search(&records, "lodgr", &config, 10)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!((results[0].score - 0.2).abs() < 1e-12);
        assert_eq!(results[0].score, results[1].score);
        // Equal scores keep input order.
        assert_eq!(results[0].ref_index, 0);
    }

    #[test]
    fn test_sorted_by_score() {
        let config = SearchConfig::new().field_names(["name"]);
        let results = ApproximateMatcher::new()
            .search(&records(), "lodge", &config, 10)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].ref_index, 1);
        assert_eq!(results[1].ref_index, 0);
        assert!((results[1].score - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_limit() {
        let config = SearchConfig::new().field_names(["name"]);
        let matcher = ApproximateMatcher::new();
        assert_eq!(matcher.search(&records(), "alpine", &config, 1).unwrap().len(), 1);
        assert!(matcher.search(&records(), "alpine", &config, 0).unwrap().is_empty());
    }

    #[test]
    fn test_weights_shape_score() {
        // "lodge" matches name at 0.0 and nothing in city: only name contributes.
        let config = SearchConfig::new().fields(vec![
            SearchField::weighted("name", 3.0),
            SearchField::weighted("city", 1.0),
        ]);
        let results = ApproximateMatcher::new()
            .search(&records(), "ridge", &config, 10)
            .unwrap();

        let first = &results[0];
        assert_eq!(first.ref_index, 0);
        let expected = EXACT_SCORE.powf(0.75);
        assert!((first.score - expected).abs() < 1e-18);
    }

    #[test]
    fn test_include_matches() {
        let config = SearchConfig::new()
            .field_names(["city", "name"])
            .include_matches(true);
        let results = ApproximateMatcher::new()
            .search(&records(), "aspen", &config, 10)
            .unwrap();

        assert_eq!(results.len(), 1);
        let diagnostic = &results[0].matches[0];
        assert_eq!(diagnostic.key, "city");
        assert_eq!(diagnostic.value, "Aspen");
        assert_eq!(diagnostic.indices, vec![(0, 4)]);
    }

    #[test]
    fn test_array_fields_and_find_all_matches() {
        let records = vec![
            Record::from_value(json!({"id": 1, "tags": ["lodge", "ski lodge", "beach"]})).unwrap(),
        ];
        let config = SearchConfig::new()
            .field_names(["tags"])
            .include_matches(true);

        let best_only = ApproximateMatcher::new()
            .search(&records, "lodge", &config, 10)
            .unwrap();
        assert_eq!(best_only[0].matches.len(), 1);
        assert_eq!(best_only[0].matches[0].array_index, Some(0));

        let config = config.find_all_matches(true);
        let all = ApproximateMatcher::new()
            .search(&records, "lodge", &config, 10)
            .unwrap();
        let indices: Vec<_> = all[0].matches.iter().map(|m| m.array_index).collect();
        assert_eq!(indices, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_extended_inverse_requires_all_fields() {
        let config = SearchConfig::new()
            .field_names(["name", "city"])
            .use_extended_search(true);
        let results = ApproximateMatcher::new()
            .search(&records(), "!alpine", &config, 10)
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.ref_index).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_unmatched_records_omitted() {
        let config = SearchConfig::new().field_names(["name"]);
        let results = ApproximateMatcher::new()
            .search(&records(), "zzzzzz", &config, 10)
            .unwrap();
        assert!(results.is_empty());
    }
}
