//! # fuzzyrank
//!
//! Multi-term fuzzy ranking over JSON records.
//!
//! A free-text query is split into whitespace-delimited terms. Each term is
//! matched on its own against a configurable set of record fields, and the
//! per-term results are merged by record identity into one ranked list.
//!
//! ## Features
//!
//! - Approximate matching with per-field weights and a tunable threshold
//! - Multiplicative score composition across terms
//! - Deterministic ordering with stable tie-breaking
//! - Lenient request normalization for string-typed parameters
//! - Central search over several record collections at once
//!
//! ## Example
//!
//! ```
//! use fuzzyrank::prelude::*;
//! use serde_json::json;
//!
//! let records = vec![
//!     Record::from_value(json!({"id": 1, "name": "Alpine Ridge"})).unwrap(),
//!     Record::from_value(json!({"id": 2, "name": "Alpine Lodge"})).unwrap(),
//! ];
//! let config = SearchConfig::default().field_names(["name"]);
//!
//! let results = search(&records, "Alpine Lodge", &config).unwrap();
//! assert_eq!(results[0].ref_index, 1);
//! ```

pub mod cli;
pub mod error;
pub mod matcher;
pub mod query;
pub mod record;
pub mod search;
pub mod util;

pub mod prelude {
    pub use crate::error::{FuzzyRankError, Result};
    pub use crate::matcher::{ApproximateMatcher, MatchDiagnostic, MatchResult, Matcher};
    pub use crate::query::{QueryNormalizer, SearchConfig, SearchField, SearchRequest};
    pub use crate::record::{Record, RecordId, RecordSet};
    pub use crate::search::{AggregatedResult, Aggregator, search, search_collections};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
