//! Command implementations for the fuzzyrank CLI.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde_json::Value;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{FuzzyRankError, Result};
use crate::query::{QueryNormalizer, SearchConfig, SearchRequest};
use crate::record::{Record, RecordSet, discover_fields};
use crate::search::{Aggregator, search_collections};

/// Records loaded from a file.
#[derive(Debug, Clone)]
pub enum RecordSource {
    /// One untagged collection.
    Single(Vec<Record>),
    /// Several collections keyed by model name.
    Collections(Vec<RecordSet>),
}

/// Execute a CLI command.
pub fn execute_command(args: FuzzyRankArgs) -> Result<()> {
    match &args.command {
        Command::Search(search_args) => {
            let results = run_search(search_args)?;
            output_result("Search completed", &results, &args)
        }
        Command::Fields(fields_args) => {
            let fields = run_fields(fields_args)?;
            output_result("Searchable fields", &fields, &args)
        }
    }
}

/// Search a records file.
pub fn run_search(args: &SearchArgs) -> Result<SearchResults> {
    log::info!("searching {} for {:?}", args.records_file.display(), args.query);

    let source = load_records(&args.records_file)?;
    let request = build_request(args)?;
    let normalizer =
        QueryNormalizer::new(SearchConfig::default().identity_field(args.identity_field.as_str()));
    let aggregator = Aggregator::default();

    let start_time = Instant::now();
    let hits: Vec<SearchHit> = match source {
        RecordSource::Single(records) => {
            let records = match &args.model {
                Some(model) => RecordSet::new(model.as_str(), records).records,
                None => records,
            };
            aggregator
                .search_request(&records, &request, &normalizer)?
                .iter()
                .map(SearchHit::from)
                .collect()
        }
        RecordSource::Collections(mut sets) => {
            if let Some(model) = &args.model {
                sets.retain(|set| &set.model == model);
                if sets.is_empty() {
                    log::warn!("no records for model {model}");
                }
            }
            search_collections(&aggregator, &sets, &request, &normalizer)?
                .iter()
                .map(SearchHit::from)
                .collect()
        }
    };
    let duration = start_time.elapsed();

    log::info!("{} hits in {:?}", hits.len(), duration);

    Ok(SearchResults {
        query: request.query,
        total_hits: hits.len(),
        hits,
        duration_ms: duration.as_millis() as u64,
    })
}

/// List the searchable fields of a records file.
pub fn run_fields(args: &FieldsArgs) -> Result<Vec<FieldList>> {
    let lists = match load_records(&args.records_file)? {
        RecordSource::Single(records) => vec![FieldList {
            model: None,
            fields: records.first().map(discover_fields).unwrap_or_default(),
        }],
        RecordSource::Collections(sets) => sets
            .iter()
            .map(|set| FieldList {
                model: Some(set.model.clone()),
                fields: set.records.first().map(discover_fields).unwrap_or_default(),
            })
            .collect(),
    };
    Ok(lists)
}

/// Build the search request: `--config` JSON first, flags on top.
pub fn build_request(args: &SearchArgs) -> Result<SearchRequest> {
    let mut request = match &args.config {
        Some(json) => serde_json::from_str::<SearchRequest>(json).map_err(|e| {
            FuzzyRankError::configuration(format!("invalid --config JSON: {e}"))
        })?,
        None => SearchRequest::default(),
    };

    request.query = args.query.clone();
    if let Some(threshold) = &args.threshold {
        request.threshold = Some(Value::String(threshold.clone()));
    }
    if let Some(limit) = &args.limit {
        request.limit = Some(Value::String(limit.clone()));
    }
    if let Some(weights) = &args.weights {
        request.weights = Some(Value::String(weights.clone()));
    }
    if !args.fields.is_empty() {
        request.fields = Some(args.fields.clone());
    }
    if args.no_matches {
        request.include_matches = Some(false);
    }
    request.find_all_matches |= args.find_all_matches;
    request.use_extended_search |= args.extended;
    request.always_aggregate |= args.always_aggregate;

    Ok(request)
}

/// Load records from a JSON array, JSONL, or model-keyed JSON object file.
pub fn load_records(path: &Path) -> Result<RecordSource> {
    log::debug!("loading records from {}", path.display());
    let text = fs::read_to_string(path)?;
    parse_records(&text)
}

/// Parse records from text.
///
/// A top-level object whose values are all arrays is read as collections
/// keyed by model name, in key order. Any other object is the first line of
/// a JSONL file.
pub fn parse_records(text: &str) -> Result<RecordSource> {
    let trimmed = text.trim_start();

    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)?;
        return records_from_values(values).map(RecordSource::Single);
    }

    if trimmed.starts_with('{')
        && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed)
        && !map.is_empty()
        && map.values().all(Value::is_array)
    {
        let mut sets = Vec::with_capacity(map.len());
        for (model, value) in map {
            let Value::Array(values) = value else {
                continue;
            };
            sets.push(RecordSet::new(model, records_from_values(values)?));
        }
        return Ok(RecordSource::Collections(sets));
    }

    let mut records = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| {
            FuzzyRankError::configuration(format!("line {}: {}", line_num + 1, e))
        })?;
        records.push(Record::from_value(value)?);
    }
    Ok(RecordSource::Single(records))
}

fn records_from_values(values: Vec<Value>) -> Result<Vec<Record>> {
    values.into_iter().map(Record::from_value).collect()
}
