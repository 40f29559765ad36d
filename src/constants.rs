/// Constants used by matcher thresholds and scoring.
pub mod matching {
    /// Minimum character similarity for a fuzzy match to be accepted outright.
    pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.70;
    /// Lower bound of the borderline band where phonetic equality can rescue a pair.
    pub const DEFAULT_PHONETIC_FALLBACK_LOW: f64 = 0.60;
    /// Minimum confidence an emitted match must reach.
    pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 70;
    /// Fuzzy matches never report more confidence than this (exact matches outrank them).
    pub const FUZZY_CONFIDENCE_CAP: f64 = 95.0;
    /// Penalty applied to swapped fuzzy matches.
    pub const SWAP_PENALTY: f64 = 5.0;
}

/// Constants used by blocking-key assignment and block construction.
pub mod blocking {
    /// Blocks larger than this are split into consecutive chunks.
    pub const DEFAULT_MAX_BLOCK_SIZE: usize = 10_000;
    /// Key prefix for records with a postal code but no street.
    pub const KEY_PREFIX_PLZ_ONLY: &str = "plz";
    /// Key prefix for records with a street but no postal code.
    pub const KEY_PREFIX_STREET_ONLY: &str = "str";
    /// Key prefix for address-less records bucketed by phonetic codes.
    pub const KEY_PREFIX_PHONETIC: &str = "phon";
    /// Separator between blocking-key components.
    pub const KEY_SEPARATOR: char = '|';
}

/// Constants used by the block runner.
pub mod runner {
    /// Below this many blocks the runner stays sequential; thread startup
    /// overhead exceeds the gain.
    pub const SEQUENTIAL_BLOCK_LIMIT: usize = 10;
    /// Progress is logged every this many completed blocks.
    pub const PROGRESS_LOG_INTERVAL: usize = 100;
}
