use thiserror::Error;

/// Error type for configuration failures.
///
/// Data-level problems (unparseable dates, empty fields) never surface here;
/// they degrade to absent fields during normalization. Only configuration
/// errors abort a run, and they do so before any work starts.
#[derive(Debug, Error)]
pub enum DedupError {
    #[error("configuration error: {0}")]
    Configuration(String),
}
