//! Per-block two-stage matcher.
//!
//! Stage 1 resolves exact matches on normalized names (direct and swapped).
//! Stage 2 runs fuzzy similarity over the remaining pairs, with a phonetic
//! fallback band for borderline scores. Records paired in Stage 1 are
//! excluded from Stage 2 entirely.

use std::collections::HashSet;

use crate::blocking::Block;
use crate::config::MatcherConfig;
use crate::data::{address_ratio, NormalizedDataset, NormalizedRecord};
use crate::rules::gate_passes;
use crate::score::{confidence, Match, MatchType};
use crate::similarity::compare_names;

/// Evaluate every candidate pair of one block and return its accepted
/// matches. Pure: no shared mutable state, safe to call from any worker.
pub fn match_block(dataset: &NormalizedDataset, block: &Block, config: &MatcherConfig) -> Vec<Match> {
    let mut matches = Vec::new();
    let mut matched_in_stage1: HashSet<usize> = HashSet::new();
    let members = &block.members;

    // Stage 1: exact matching on normalized names.
    for (pos, &offset_a) in members.iter().enumerate() {
        let a = dataset.get(offset_a);
        if !a.has_full_name() {
            continue;
        }
        for &offset_b in &members[pos + 1..] {
            let b = dataset.get(offset_b);
            if !b.has_full_name() {
                continue;
            }
            if !gate_passes(a, b, config.missing_year_policy) {
                continue;
            }
            let direct = a.given_name == b.given_name && a.surname == b.surname;
            let swapped = !direct && a.given_name == b.surname && a.surname == b.given_name;
            if !direct && !swapped {
                continue;
            }
            let match_type = if direct {
                MatchType::ExactNormal
            } else {
                MatchType::ExactSwapped
            };
            matched_in_stage1.insert(offset_a);
            matched_in_stage1.insert(offset_b);
            push_if_confident(&mut matches, a, b, match_type, 1.0, config);
        }
    }

    // Stage 2: fuzzy matching with phonetic fallback, skipping every
    // record Stage 1 already paired.
    for (pos, &offset_a) in members.iter().enumerate() {
        if matched_in_stage1.contains(&offset_a) {
            continue;
        }
        let a = dataset.get(offset_a);
        for &offset_b in &members[pos + 1..] {
            if matched_in_stage1.contains(&offset_b) {
                continue;
            }
            let b = dataset.get(offset_b);
            if !gate_passes(a, b, config.missing_year_policy) {
                continue;
            }
            let Some(cmp) = compare_names(&a.given_name, &a.surname, &b.given_name, &b.surname)
            else {
                continue;
            };
            let best = cmp.best();
            if best >= config.fuzzy_threshold {
                let match_type = if cmp.best_is_swapped() {
                    MatchType::FuzzySwapped
                } else {
                    MatchType::FuzzyNormal
                };
                push_if_confident(&mut matches, a, b, match_type, best, config);
            } else if config.use_phonetic && best >= config.phonetic_fallback_low {
                if let Some(match_type) = phonetic_fallback(a, b) {
                    push_if_confident(&mut matches, a, b, match_type, best, config);
                }
            }
        }
    }

    matches
}

/// Phonetic equality check for the borderline band. Direct order takes
/// precedence; swapped only counts when the direct comparison fails.
fn phonetic_fallback(a: &NormalizedRecord, b: &NormalizedRecord) -> Option<MatchType> {
    if a.given_phon.is_empty()
        || a.surname_phon.is_empty()
        || b.given_phon.is_empty()
        || b.surname_phon.is_empty()
    {
        return None;
    }
    if a.given_phon == b.given_phon && a.surname_phon == b.surname_phon {
        return Some(MatchType::PhoneticAssistedNormal);
    }
    if a.given_phon == b.surname_phon && a.surname_phon == b.given_phon {
        return Some(MatchType::PhoneticAssistedSwapped);
    }
    None
}

fn push_if_confident(
    matches: &mut Vec<Match>,
    a: &NormalizedRecord,
    b: &NormalizedRecord,
    match_type: MatchType,
    name_score: f64,
    config: &MatcherConfig,
) {
    let score = confidence(match_type, name_score, address_ratio(a, b));
    if score < config.confidence_threshold {
        return;
    }
    let (id_a, id_b) = if a.id < b.id { (a.id, b.id) } else { (b.id, a.id) };
    matches.push(Match {
        id_a,
        id_b,
        match_type,
        confidence: score,
    });
}
