//! Match classification and confidence scoring.

use serde::{Deserialize, Serialize};

use crate::constants::matching::{FUZZY_CONFIDENCE_CAP, SWAP_PENALTY};
use crate::types::RecordId;

/// The six typed outcomes of the matcher. Closed set with explicit
/// discriminants; wire names are the snake_case strings of the export
/// schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MatchType {
    /// Stage 1: normalized names equal in direct order.
    ExactNormal = 0,
    /// Stage 1: normalized names equal with given/surname exchanged.
    ExactSwapped = 1,
    /// Stage 2 fallback: borderline similarity, phonetic codes equal.
    PhoneticAssistedNormal = 2,
    /// Stage 2 fallback: borderline similarity, phonetic codes equal in
    /// swapped order.
    PhoneticAssistedSwapped = 3,
    /// Stage 2: character similarity at or above the fuzzy threshold.
    FuzzyNormal = 4,
    /// Stage 2: swapped character similarity at or above the fuzzy
    /// threshold.
    FuzzySwapped = 5,
}

impl MatchType {
    /// Precedence when the same pair is produced twice (lower wins):
    /// exact beats fuzzy beats phonetic-assisted, direct beats swapped.
    pub fn rank(&self) -> u8 {
        match self {
            MatchType::ExactNormal => 0,
            MatchType::ExactSwapped => 1,
            MatchType::FuzzyNormal => 2,
            MatchType::FuzzySwapped => 3,
            MatchType::PhoneticAssistedNormal => 4,
            MatchType::PhoneticAssistedSwapped => 5,
        }
    }

    /// Wire name as used in the export schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::ExactNormal => "exact_normal",
            MatchType::ExactSwapped => "exact_swapped",
            MatchType::PhoneticAssistedNormal => "phonetic_assisted_normal",
            MatchType::PhoneticAssistedSwapped => "phonetic_assisted_swapped",
            MatchType::FuzzyNormal => "fuzzy_normal",
            MatchType::FuzzySwapped => "fuzzy_swapped",
        }
    }

    /// Whether given name and surname are exchanged between the records.
    pub fn is_swapped(&self) -> bool {
        matches!(
            self,
            MatchType::ExactSwapped
                | MatchType::PhoneticAssistedSwapped
                | MatchType::FuzzySwapped
        )
    }
}

/// An accepted record pair. `id_a < id_b` always holds; a pair is reported
/// at most once regardless of which stage produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Lower record id of the pair.
    pub id_a: RecordId,
    /// Higher record id of the pair.
    pub id_b: RecordId,
    /// Classification of the match.
    pub match_type: MatchType,
    /// Confidence in `[0, 100]`, bounded per type.
    pub confidence: u8,
}

/// Compute the confidence for a match.
///
/// `name_score` is the accepted ordering's similarity (only consulted for
/// the fuzzy types); `address_ratio` is the fraction of mutually populated
/// address fields that agree. Values follow the fixed table: exact matches
/// start at 90/85, phonetic-assisted at 72/70, each plus up to 10 address
/// points; fuzzy matches combine 50 name points with 30 address points
/// (minus the swap penalty) and never exceed the fuzzy cap.
pub fn confidence(match_type: MatchType, name_score: f64, address_ratio: f64) -> u8 {
    let value = match match_type {
        MatchType::ExactNormal => 90.0 + 10.0 * address_ratio,
        MatchType::ExactSwapped => 85.0 + 10.0 * address_ratio,
        MatchType::PhoneticAssistedNormal => 72.0 + 10.0 * address_ratio,
        MatchType::PhoneticAssistedSwapped => 70.0 + 10.0 * address_ratio,
        MatchType::FuzzyNormal => {
            (50.0 * name_score + 30.0 * address_ratio).min(FUZZY_CONFIDENCE_CAP)
        }
        MatchType::FuzzySwapped => {
            (50.0 * name_score + 30.0 * address_ratio - SWAP_PENALTY).min(FUZZY_CONFIDENCE_CAP)
        }
    };
    value.clamp(0.0, 100.0).floor() as u8
}

/// Of two candidate classifications for the same pair, keep the better:
/// higher-ranking type first, higher confidence on ties.
pub fn better_of(current: Match, incoming: Match) -> Match {
    let current_key = (current.match_type.rank(), u8::MAX - current.confidence);
    let incoming_key = (incoming.match_type.rank(), u8::MAX - incoming.confidence);
    if incoming_key < current_key {
        incoming
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_respects_the_type_intervals() {
        assert_eq!(confidence(MatchType::ExactNormal, 1.0, 0.0), 90);
        assert_eq!(confidence(MatchType::ExactNormal, 1.0, 1.0), 100);
        assert_eq!(confidence(MatchType::ExactSwapped, 1.0, 1.0), 95);
        assert_eq!(confidence(MatchType::PhoneticAssistedNormal, 0.65, 0.0), 72);
        assert_eq!(confidence(MatchType::PhoneticAssistedSwapped, 0.65, 1.0), 80);
    }

    #[test]
    fn fuzzy_confidence_caps_at_95() {
        assert_eq!(confidence(MatchType::FuzzyNormal, 1.0, 1.0), 80);
        assert_eq!(confidence(MatchType::FuzzyNormal, 0.99, 1.0), 79);
        // The cap only bites for scores the formula cannot reach with the
        // 50/30 weights, but it is a hard bound all the same.
        assert!(confidence(MatchType::FuzzyNormal, 1.0, 1.0) <= 95);
        assert_eq!(confidence(MatchType::FuzzySwapped, 1.0, 1.0), 75);
    }

    #[test]
    fn confidence_floors_to_an_integer() {
        // 50 * 0.875 + 30 * 0.5 = 58.75
        assert_eq!(confidence(MatchType::FuzzyNormal, 0.875, 0.5), 58);
    }

    #[test]
    fn rank_orders_exact_over_fuzzy_over_phonetic() {
        let ranked = [
            MatchType::ExactNormal,
            MatchType::ExactSwapped,
            MatchType::FuzzyNormal,
            MatchType::FuzzySwapped,
            MatchType::PhoneticAssistedNormal,
            MatchType::PhoneticAssistedSwapped,
        ];
        for window in ranked.windows(2) {
            assert!(window[0].rank() < window[1].rank());
        }
    }

    #[test]
    fn better_of_prefers_rank_then_confidence() {
        let exact = Match {
            id_a: 1,
            id_b: 2,
            match_type: MatchType::ExactSwapped,
            confidence: 85,
        };
        let fuzzy = Match {
            id_a: 1,
            id_b: 2,
            match_type: MatchType::FuzzyNormal,
            confidence: 95,
        };
        assert_eq!(better_of(fuzzy, exact), exact);
        assert_eq!(better_of(exact, fuzzy), exact);

        let weaker_exact = Match {
            confidence: 80,
            ..exact
        };
        assert_eq!(better_of(weaker_exact, exact), exact);
    }

    #[test]
    fn wire_names_use_snake_case() {
        assert_eq!(MatchType::ExactNormal.as_str(), "exact_normal");
        assert_eq!(MatchType::PhoneticAssistedSwapped.as_str(), "phonetic_assisted_swapped");
        let json = serde_json::to_string(&MatchType::FuzzySwapped).unwrap();
        assert_eq!(json, "\"fuzzy_swapped\"");
    }
}
