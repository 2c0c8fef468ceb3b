//! The multi-term aggregator.
//!
//! Single-term queries go straight to the matcher once. Anything else runs
//! the matcher per term and merges by record identity: a record matched by
//! several terms gets the product of its term scores, a record matched by a
//! single term keeps that term's score. The merged list is sorted ascending
//! by score (ties in first-seen order) and capped at the configured limit.

use std::borrow::Cow;

use rayon::prelude::*;

use crate::error::{FuzzyRankError, Result};
use crate::matcher::{ApproximateMatcher, MatchResult, Matcher};
use crate::query::config::{SearchConfig, SearchField};
use crate::query::normalizer::{QueryNormalizer, SearchRequest, decode_query, split_terms};
use crate::record::{Record, RecordId, discover_fields, resolve_identities};
use crate::search::accumulator::ScoreAccumulator;
use crate::search::{AggregatedResult, rank};

/// Search `records` for `query` with the default [`ApproximateMatcher`].
///
/// `query` must already be percent-decoded.
pub fn search<'a>(
    records: &'a [Record],
    query: &str,
    config: &SearchConfig,
) -> Result<Vec<AggregatedResult<'a>>> {
    Aggregator::default().search(records, query, config)
}

/// Runs a [`Matcher`] per query term and merges the results.
#[derive(Debug)]
pub struct Aggregator {
    matcher: Box<dyn Matcher>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Aggregator::new(Box::new(ApproximateMatcher::new()))
    }
}

impl Aggregator {
    /// Create an aggregator around `matcher`.
    pub fn new(matcher: Box<dyn Matcher>) -> Self {
        Aggregator { matcher }
    }

    /// The underlying matcher.
    pub fn matcher(&self) -> &dyn Matcher {
        self.matcher.as_ref()
    }

    /// Search `records` for an already percent-decoded `query`.
    pub fn search<'a>(
        &self,
        records: &'a [Record],
        query: &str,
        config: &SearchConfig,
    ) -> Result<Vec<AggregatedResult<'a>>> {
        self.search_terms(records, &split_terms(query), config)
    }

    /// Normalize a raw request against `records` and search.
    pub fn search_request<'a>(
        &self,
        records: &'a [Record],
        request: &SearchRequest,
        normalizer: &QueryNormalizer,
    ) -> Result<Vec<AggregatedResult<'a>>> {
        let Some(sample) = records.first() else {
            return Ok(Vec::new());
        };
        // A blank query is an empty result even when the weights are unusable.
        if split_terms(&decode_query(&request.query)).is_empty() {
            log::debug!("blank query, nothing to search");
            return Ok(Vec::new());
        }

        let normalized = normalizer.normalize(request, &discover_fields(sample))?;
        self.search_terms(records, &normalized.terms, &normalized.config)
    }

    /// Search `records` for an already decomposed term list.
    pub fn search_terms<'a>(
        &self,
        records: &'a [Record],
        terms: &[String],
        config: &SearchConfig,
    ) -> Result<Vec<AggregatedResult<'a>>> {
        let Some(sample) = records.first() else {
            log::debug!("no records to search");
            return Ok(Vec::new());
        };
        if terms.is_empty() {
            log::debug!("blank query, nothing to search");
            return Ok(Vec::new());
        }

        let mut config = resolve_fields(config, sample);
        if !config.is_in_range() {
            config.to_mut().clamp_to_range();
        }
        config.validate()?;

        let ids = resolve_identities(records, &config.identity_field)?;
        let model_name = sample.model().map(str::to_string);

        let mut results = if terms.len() == 1 && !config.always_aggregate {
            log::debug!("single term {:?}, matching once", terms[0]);
            self.search_single(records, &ids, &terms[0], &config)?
        } else {
            log::debug!("aggregating {} terms over {} records", terms.len(), records.len());
            self.search_aggregated(records, &ids, terms, &config)?
        };

        for result in &mut results {
            result.model_name = model_name.clone();
        }

        Ok(results)
    }

    fn search_single<'a>(
        &self,
        records: &'a [Record],
        ids: &[RecordId],
        term: &str,
        config: &SearchConfig,
    ) -> Result<Vec<AggregatedResult<'a>>> {
        let matched = self.matcher.search(records, term, config, config.limit)?;

        let mut results = Vec::with_capacity(matched.len());
        for result in matched {
            let (Some(record), Some(id)) = (records.get(result.ref_index), ids.get(result.ref_index))
            else {
                return Err(FuzzyRankError::matcher(format!(
                    "match refers to record {} of {}",
                    result.ref_index,
                    records.len()
                )));
            };
            results.push(AggregatedResult {
                record,
                ref_index: result.ref_index,
                id: id.clone(),
                score: result.score,
                matches: result.matches,
                model_name: None,
            });
        }

        rank(&mut results, config.limit);
        Ok(results)
    }

    fn search_aggregated<'a>(
        &self,
        records: &'a [Record],
        ids: &[RecordId],
        terms: &[String],
        config: &SearchConfig,
    ) -> Result<Vec<AggregatedResult<'a>>> {
        // Cap only after merging so later terms can still lift a candidate.
        let term_limit = config.term_limit.unwrap_or(records.len());

        let per_term: Vec<Vec<MatchResult>> = if config.parallel_terms && terms.len() > 1 {
            terms
                .par_iter()
                .map(|term| self.matcher.search(records, term, config, term_limit))
                .collect::<Result<_>>()?
        } else {
            terms
                .iter()
                .map(|term| self.matcher.search(records, term, config, term_limit))
                .collect::<Result<_>>()?
        };

        let mut accumulator = ScoreAccumulator::new(records, ids);
        for (term, results) in terms.iter().zip(per_term) {
            log::trace!("term {:?} contributed {} matches", term, results.len());
            accumulator.add_term(results)?;
        }

        Ok(accumulator.into_ranked(config.limit))
    }
}

/// Fill an empty field list from the sample record.
fn resolve_fields<'c>(config: &'c SearchConfig, sample: &Record) -> Cow<'c, SearchConfig> {
    if !config.fields.is_empty() {
        return Cow::Borrowed(config);
    }

    let mut resolved = config.clone();
    resolved.fields = discover_fields(sample)
        .into_iter()
        .map(SearchField::new)
        .collect();
    Cow::Owned(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Record> {
        vec![
            Record::from_value(json!({"id": 1, "name": "Alpine Ridge"})).unwrap(),
            Record::from_value(json!({"id": 2, "name": "Alpine Lodge"})).unwrap(),
            Record::from_value(json!({"id": 3, "name": "Coastal View"})).unwrap(),
        ]
    }

    /// Matcher returning canned scores per term. The term "boom" fails.
    #[derive(Debug, Default)]
    struct ScriptedMatcher {
        scores: Vec<(&'static str, Vec<(usize, f64)>)>,
    }

    impl ScriptedMatcher {
        fn new(scores: Vec<(&'static str, Vec<(usize, f64)>)>) -> Self {
            ScriptedMatcher { scores }
        }
    }

    impl Matcher for ScriptedMatcher {
        fn search(
            &self,
            _records: &[Record],
            term: &str,
            _config: &SearchConfig,
            limit: usize,
        ) -> Result<Vec<MatchResult>> {
            if term == "boom" {
                return Err(FuzzyRankError::matcher("boom"));
            }

            Ok(self
                .scores
                .iter()
                .find(|(t, _)| *t == term)
                .map(|(_, hits)| {
                    hits.iter()
                        .take(limit)
                        .map(|&(ref_index, score)| MatchResult {
                            ref_index,
                            score,
                            matches: Vec::new(),
                        })
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    #[test]
    fn test_multiplicative_composition() {
        let matcher = ScriptedMatcher::new(vec![
            ("a", vec![(0, 0.6), (1, 0.3)]),
            ("b", vec![(1, 0.5)]),
        ]);
        let aggregator = Aggregator::new(Box::new(matcher));
        let records = records();
        let config = SearchConfig::new().field_names(["name"]);

        let results = aggregator.search(&records, "a b", &config).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, RecordId::Integer(2));
        assert!((results[0].score - 0.15).abs() < 1e-12);
        assert!(results[0].score <= 0.3_f64.min(0.5));
        assert_eq!(results[1].id, RecordId::Integer(1));
        assert_eq!(results[1].score, 0.6);
    }

    #[test]
    fn test_term_without_matches_changes_nothing() {
        let matcher = ScriptedMatcher::new(vec![("a", vec![(0, 0.6), (1, 0.3)])]);
        let aggregator = Aggregator::new(Box::new(matcher));
        let records = records();
        let config = SearchConfig::new().field_names(["name"]);

        let results = aggregator.search(&records, "a nothing", &config).unwrap();
        let scores: Vec<_> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.3, 0.6]);
    }

    #[test]
    fn test_single_term_uses_one_call_with_limit() {
        let matcher = ScriptedMatcher::new(vec![("a", vec![(0, 0.6), (1, 0.3), (2, 0.9)])]);
        let aggregator = Aggregator::new(Box::new(matcher));
        let records = records();
        let config = SearchConfig::new().field_names(["name"]).limit(2);

        let results = aggregator.search(&records, "a", &config).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, 0.3);
        assert_eq!(results[1].score, 0.6);
    }

    #[test]
    fn test_per_term_calls_are_uncapped_by_default() {
        let matcher = ScriptedMatcher::new(vec![
            ("a", vec![(0, 0.1), (1, 0.2), (2, 0.3)]),
            ("b", vec![(2, 0.1)]),
        ]);
        let aggregator = Aggregator::new(Box::new(matcher));
        let records = records();
        let config = SearchConfig::new()
            .field_names(["name"])
            .limit(1)
            .parallel_terms(false);

        let results = aggregator.search(&records, "a b", &config).unwrap();
        // Record 3 is the weakest for "a" but wins after "b" is merged in.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ref_index, 2);
    }

    #[test]
    fn test_empty_inputs_skip_matcher() {
        // Any call to this matcher with "boom" would fail the search.
        let aggregator = Aggregator::new(Box::new(ScriptedMatcher::default()));
        let config = SearchConfig::new();

        assert!(aggregator.search(&[], "boom", &config).unwrap().is_empty());
        assert!(aggregator.search(&records(), "", &config).unwrap().is_empty());
        assert!(aggregator.search(&records(), "   ", &config).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_config_is_clamped() {
        let records = records();
        let zero_limit = SearchConfig::new().field_names(["name"]).limit(0);
        assert_eq!(search(&records, "alpine", &zero_limit).unwrap().len(), 2);
        assert_eq!(search(&records, "alpine lodge", &zero_limit).unwrap().len(), 2);

        for threshold in [-0.1, f64::NAN] {
            let config = SearchConfig::new().field_names(["name"]).threshold(threshold);
            let results = search(&records, "alpine", &config).unwrap();
            assert_eq!(results.len(), 2, "threshold {threshold}");
        }

        let loose = SearchConfig::new().field_names(["name"]).threshold(7.0);
        assert!(!search(&records, "alpine lodge", &loose).unwrap().is_empty());
    }

    #[test]
    fn test_blank_request_skips_weights() {
        let request = SearchRequest::new("%20").weights("{not json");
        let records = records();
        let results = Aggregator::default()
            .search_request(&records, &request, &QueryNormalizer::default())
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_identity_fails_fast() {
        let records = vec![
            Record::from_value(json!({"id": 1, "name": "Alpine"})).unwrap(),
            Record::from_value(json!({"name": "Alpine"})).unwrap(),
        ];
        let config = SearchConfig::new().field_names(["name"]);

        match search(&records, "alpine", &config) {
            Err(FuzzyRankError::MissingIdentity { position, .. }) => assert_eq!(position, 1),
            other => panic!("Expected missing identity error, got {other:?}"),
        }
    }

    #[test]
    fn test_matcher_failure_propagates() {
        let matcher = ScriptedMatcher::new(vec![("a", vec![(0, 0.1)])]);
        let aggregator = Aggregator::new(Box::new(matcher));
        let config = SearchConfig::new().field_names(["name"]);

        let records = records();
        let result = aggregator.search(&records, "a boom", &config);
        assert!(matches!(result, Err(FuzzyRankError::Matcher(_))));
    }

    #[test]
    fn test_fields_discovered_from_sample() {
        let records = records();
        let results = search(&records, "lodge", &SearchConfig::new()).unwrap();
        assert_eq!(results[0].ref_index, 1);
    }

    #[test]
    fn test_model_tag_from_first_record() {
        let records: Vec<Record> = records()
            .into_iter()
            .map(|r| r.with_model("Hotel"))
            .collect();
        let config = SearchConfig::new().field_names(["name"]);

        let results = search(&records, "alpine lodge", &config).unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.model_name.as_deref() == Some("Hotel")));
    }

    #[test]
    fn test_search_request() {
        let records = records();
        let request = SearchRequest::new("Alpine%20Lodge").limit("abc");

        let results = Aggregator::default()
            .search_request(&records, &request, &QueryNormalizer::default())
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.ref_index).collect();
        assert_eq!(ids, vec![1, 0]);
    }
}
