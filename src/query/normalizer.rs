//! Query normalization: raw request inputs to a clean configuration and term list.
//!
//! Request layers hand over whatever they received: a percent-encoded query,
//! a threshold and limit that may be numbers or strings, and custom weights
//! that may be a JSON object or a JSON-encoded string. Everything numeric
//! falls back to a default instead of failing; only unusable weight payloads
//! are rejected.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FuzzyRankError, Result};
use crate::query::config::{DEFAULT_WEIGHT, SearchConfig, SearchField};

/// Raw, request-level search inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    /// Percent-encoded query text.
    pub query: String,
    /// Raw threshold: number, numeric string, or absent.
    pub threshold: Option<Value>,
    /// Raw limit: number, numeric string, or absent.
    pub limit: Option<Value>,
    /// Raw custom weights: JSON object or JSON-encoded string.
    pub weights: Option<Value>,
    /// Restrict matching to these fields instead of the discovered ones.
    pub fields: Option<Vec<String>>,
    /// Report matched positions. Absent keeps the base configuration's choice.
    pub include_matches: Option<bool>,
    /// Report every matching array element.
    pub find_all_matches: bool,
    /// Interpret extended query syntax.
    pub use_extended_search: bool,
    /// Route single-term queries through the accumulator.
    pub always_aggregate: bool,
}

impl SearchRequest {
    /// Create a request for the given raw query.
    pub fn new<S: Into<String>>(query: S) -> Self {
        SearchRequest {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the raw threshold.
    pub fn threshold<V: Into<Value>>(mut self, threshold: V) -> Self {
        self.threshold = Some(threshold.into());
        self
    }

    /// Set the raw limit.
    pub fn limit<V: Into<Value>>(mut self, limit: V) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Set the raw custom weights.
    pub fn weights<V: Into<Value>>(mut self, weights: V) -> Self {
        self.weights = Some(weights.into());
        self
    }

    /// Restrict matching to the given fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Report matched positions.
    pub fn include_matches(mut self, include_matches: bool) -> Self {
        self.include_matches = Some(include_matches);
        self
    }

    /// Interpret extended query syntax.
    pub fn use_extended_search(mut self, use_extended_search: bool) -> Self {
        self.use_extended_search = use_extended_search;
        self
    }
}

/// Output of normalization: decoded query, its terms, and the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    /// The percent-decoded query.
    pub query: String,
    /// Whitespace-delimited terms, empties dropped.
    pub terms: Vec<String>,
    /// Configuration for the search call.
    pub config: SearchConfig,
}

/// Turns raw request inputs into a [`NormalizedQuery`].
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    base: SearchConfig,
    default_weight: f64,
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        QueryNormalizer::new(SearchConfig::default())
    }
}

impl QueryNormalizer {
    /// Create a normalizer whose fallbacks come from `base`.
    pub fn new(base: SearchConfig) -> Self {
        QueryNormalizer {
            base,
            default_weight: DEFAULT_WEIGHT,
        }
    }

    /// Use a different weight for fields without an override.
    ///
    /// Non-positive values are ignored.
    pub fn default_weight(mut self, weight: f64) -> Self {
        if weight.is_finite() && weight > 0.0 {
            self.default_weight = weight;
        } else {
            log::warn!("ignoring non-positive default weight {weight}");
        }
        self
    }

    /// Fallback configuration.
    pub fn base(&self) -> &SearchConfig {
        &self.base
    }

    /// Effective result cap for `request`.
    pub fn limit_for(&self, request: &SearchRequest) -> usize {
        coerce_limit(request.limit.as_ref(), self.base.limit)
    }

    /// Normalize `request` against the fields discovered from a sample record.
    pub fn normalize(
        &self,
        request: &SearchRequest,
        discovered_fields: &[String],
    ) -> Result<NormalizedQuery> {
        let query = decode_query(&request.query);
        let terms = split_terms(&query);

        let threshold = coerce_threshold(request.threshold.as_ref(), self.base.threshold);
        let limit = self.limit_for(request);
        let weights = parse_weights(request.weights.as_ref())?;

        let names: &[String] = request.fields.as_deref().unwrap_or(discovered_fields);
        let fields = assign_weights(names, &weights, self.default_weight);

        let mut config = self.base.clone();
        config.fields = fields;
        config.threshold = threshold;
        config.limit = limit;
        if let Some(include_matches) = request.include_matches {
            config.include_matches = include_matches;
        }
        config.find_all_matches |= request.find_all_matches;
        config.use_extended_search |= request.use_extended_search;
        config.always_aggregate |= request.always_aggregate;

        log::debug!(
            "normalized query {:?} into {} term(s), threshold={}, limit={}, fields={}",
            query,
            terms.len(),
            config.threshold,
            config.limit,
            config.fields.len()
        );

        Ok(NormalizedQuery {
            query,
            terms,
            config,
        })
    }
}

/// Percent-decode a raw query string.
///
/// Input that does not decode to valid UTF-8 is used as-is.
pub fn decode_query(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            log::warn!("query is not valid percent-encoded UTF-8 ({e}), using it verbatim");
            raw.to_string()
        }
    }
}

/// Split a decoded query on runs of whitespace, dropping empty tokens.
pub fn split_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

/// Read a number out of a raw JSON value: numbers as-is, strings parsed.
///
/// Blank strings count as absent.
fn coerce_number(raw: &Value) -> Option<f64> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Coerce a raw threshold, falling back to `default`.
///
/// Absence never means zero. Negative values fall back; values above one are
/// clamped.
pub fn coerce_threshold(raw: Option<&Value>, default: f64) -> f64 {
    let Some(raw) = raw else {
        return default;
    };

    match coerce_number(raw) {
        Some(threshold) if threshold >= 0.0 => threshold.min(1.0),
        _ => {
            log::warn!("invalid threshold {raw}, falling back to {default}");
            default
        }
    }
}

/// Coerce a raw limit, falling back to `default`.
///
/// Fractions are truncated; anything below one falls back.
pub fn coerce_limit(raw: Option<&Value>, default: usize) -> usize {
    let Some(raw) = raw else {
        return default;
    };

    match coerce_number(raw).map(f64::trunc) {
        Some(limit) if limit >= 1.0 => limit as usize,
        _ => {
            log::warn!("invalid limit {raw}, falling back to {default}");
            default
        }
    }
}

/// Parse custom weights from a JSON object or a JSON-encoded string.
///
/// Entries whose value is not a positive number are skipped. A payload that
/// is not an object at all is a configuration error.
pub fn parse_weights(raw: Option<&Value>) -> Result<AHashMap<String, f64>> {
    let mut weights = AHashMap::new();

    let parsed;
    let object = match raw {
        None | Some(Value::Null) => return Ok(weights),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(weights),
        Some(Value::String(s)) => {
            parsed = serde_json::from_str::<Value>(s).map_err(|e| {
                FuzzyRankError::configuration(format!("custom weights are not valid JSON: {e}"))
            })?;
            match &parsed {
                Value::Object(map) => map,
                _ => {
                    return Err(FuzzyRankError::configuration(
                        "custom weights must be a JSON object",
                    ));
                }
            }
        }
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(FuzzyRankError::configuration(
                "custom weights must be a JSON object",
            ));
        }
    };

    for (field, value) in object {
        match coerce_number(value) {
            Some(weight) if weight > 0.0 => {
                weights.insert(field.clone(), weight);
            }
            _ => log::warn!("ignoring invalid weight {value} for field '{field}'"),
        }
    }

    Ok(weights)
}

/// Build the field list: explicit weight when supplied, `default_weight` otherwise.
pub fn assign_weights(
    names: &[String],
    weights: &AHashMap<String, f64>,
    default_weight: f64,
) -> Vec<SearchField> {
    for field in weights.keys() {
        if !names.contains(field) {
            log::debug!("custom weight for unknown field '{field}' ignored");
        }
    }

    names
        .iter()
        .map(|name| {
            let weight = weights.get(name).copied().unwrap_or(default_weight);
            SearchField::weighted(name.clone(), weight)
        })
        .collect()
}
