use crate::constants::{blocking, matching};
use crate::errors::DedupError;

/// Policy for the birth-year rule when exactly one record carries a year.
///
/// The asymmetric case cannot confirm identity: one record claims a birth
/// year, the other is silent. The business default is to reject such pairs
/// as ambiguous; [`MissingYearPolicy::Accept`] opts into the permissive
/// behavior of an earlier rule draft.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingYearPolicy {
    /// Reject the pair as ambiguous.
    #[default]
    Reject,
    /// Let the pair through to similarity evaluation.
    Accept,
}

/// Top-level matcher configuration.
///
/// Passed once at construction; the runner carries an immutable reference
/// into every worker. Validation happens in [`MatcherConfig::validate`]
/// before any work starts.
#[derive(Clone, Debug)]
pub struct MatcherConfig {
    /// Minimum character similarity in `[0, 1]` to accept a fuzzy match.
    pub fuzzy_threshold: f64,
    /// Lower bound of the band where phonetic equality rescues a borderline
    /// pair. Must not exceed `fuzzy_threshold`.
    pub phonetic_fallback_low: f64,
    /// Minimum confidence in `[0, 100]` an emitted match must reach.
    pub confidence_threshold: u8,
    /// Enable the Stage-2 phonetic fallback band.
    pub use_phonetic: bool,
    /// Enable the multi-worker block runner.
    pub use_parallel: bool,
    /// Worker count; `None` means available cores minus one (floor 1).
    pub workers: Option<usize>,
    /// Blocks larger than this are split into consecutive chunks.
    ///
    /// Chunking can split a true duplicate pair across chunks and miss it;
    /// this is an accepted precision/throughput trade-off for degenerate
    /// blocks.
    pub max_block_size: usize,
    /// Behavior when exactly one record of a pair has birth-year data.
    pub missing_year_policy: MissingYearPolicy,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: matching::DEFAULT_FUZZY_THRESHOLD,
            phonetic_fallback_low: matching::DEFAULT_PHONETIC_FALLBACK_LOW,
            confidence_threshold: matching::DEFAULT_CONFIDENCE_THRESHOLD,
            use_phonetic: true,
            use_parallel: true,
            workers: None,
            max_block_size: blocking::DEFAULT_MAX_BLOCK_SIZE,
            missing_year_policy: MissingYearPolicy::default(),
        }
    }
}

impl MatcherConfig {
    /// Check all invariants, failing fast before any work starts.
    pub fn validate(&self) -> Result<(), DedupError> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(DedupError::Configuration(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.phonetic_fallback_low) {
            return Err(DedupError::Configuration(format!(
                "phonetic_fallback_low must be within [0, 1], got {}",
                self.phonetic_fallback_low
            )));
        }
        if self.phonetic_fallback_low > self.fuzzy_threshold {
            return Err(DedupError::Configuration(format!(
                "phonetic_fallback_low ({}) must not exceed fuzzy_threshold ({})",
                self.phonetic_fallback_low, self.fuzzy_threshold
            )));
        }
        if self.confidence_threshold > 100 {
            return Err(DedupError::Configuration(format!(
                "confidence_threshold must be within [0, 100], got {}",
                self.confidence_threshold
            )));
        }
        if self.workers == Some(0) {
            return Err(DedupError::Configuration(
                "workers must be at least 1 when set".into(),
            ));
        }
        if self.max_block_size < 2 {
            return Err(DedupError::Configuration(format!(
                "max_block_size must be at least 2, got {}",
                self.max_block_size
            )));
        }
        Ok(())
    }

    /// Resolve the effective worker count: explicit setting, else available
    /// cores minus one, never below 1.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            Some(count) => count.max(1),
            None => std::thread::available_parallelism()
                .map(|cores| cores.get().saturating_sub(1))
                .unwrap_or(1)
                .max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(MatcherConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fuzzy_threshold() {
        let config = MatcherConfig {
            fuzzy_threshold: 1.2,
            ..MatcherConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DedupError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_inverted_fallback_band() {
        let config = MatcherConfig {
            fuzzy_threshold: 0.5,
            phonetic_fallback_low: 0.6,
            ..MatcherConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DedupError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_zero_workers() {
        let config = MatcherConfig {
            workers: Some(0),
            ..MatcherConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DedupError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_degenerate_block_size() {
        let config = MatcherConfig {
            max_block_size: 1,
            ..MatcherConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DedupError::Configuration(_))
        ));
    }

    #[test]
    fn explicit_worker_count_wins() {
        let config = MatcherConfig {
            workers: Some(3),
            ..MatcherConfig::default()
        };
        assert_eq!(config.effective_workers(), 3);
    }

    #[test]
    fn derived_worker_count_is_at_least_one() {
        let config = MatcherConfig::default();
        assert!(config.effective_workers() >= 1);
    }
}
