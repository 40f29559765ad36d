#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Blocking-key assignment and block construction.
pub mod blocking;
/// Matcher configuration and validation.
pub mod config;
/// Centralized constants for thresholds, blocking, and the runner.
pub mod constants;
/// Raw and normalized record types and the shared dataset.
pub mod data;
/// Collaborator-facing export rows.
pub mod export;
/// Per-block two-stage matcher.
pub mod matcher;
/// Blocking statistics.
pub mod metrics;
/// Pure field normalizers.
pub mod normalize;
/// Kölner Phonetik encoder.
pub mod phonetic;
/// Business-rule gate for candidate pairs.
pub mod rules;
/// Parallel block runner and cancellation.
pub mod runner;
/// Match classification and confidence scoring.
pub mod score;
/// Name similarity with swap detection.
pub mod similarity;
/// Shared type aliases.
pub mod types;

mod errors;

pub use blocking::Block;
pub use config::{MatcherConfig, MissingYearPolicy};
pub use data::{NormalizedDataset, NormalizedRecord, Record};
pub use errors::DedupError;
pub use export::{export_rows, ExportRow, Position};
pub use metrics::BlockingStats;
pub use runner::{CancelToken, MatchReport, MatchRunner};
pub use score::{Match, MatchType};
pub use types::{BlockKey, MatchId, PhoneticCode, RecordId};
