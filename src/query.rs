//! Search configuration and query normalization.

pub mod config;
pub mod normalizer;

pub use self::config::{
    DEFAULT_IDENTITY_FIELD, DEFAULT_LIMIT, DEFAULT_MIN_MATCH_CHAR_LENGTH, DEFAULT_THRESHOLD,
    DEFAULT_WEIGHT, SearchConfig, SearchField,
};
pub use self::normalizer::{NormalizedQuery, QueryNormalizer, SearchRequest};
