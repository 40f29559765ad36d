//! Blocking: reduce the O(n²) candidate space into per-key groups.
//!
//! Every record gets exactly one key from a four-strategy scheme, first
//! applicable wins. The phonetic bucket (strategy 4) is the only place the
//! phonetic codes enter blocking; it rescues address-less rows from
//! degenerating into one giant block.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::constants::blocking::{
    KEY_PREFIX_PHONETIC, KEY_PREFIX_PLZ_ONLY, KEY_PREFIX_STREET_ONLY, KEY_SEPARATOR,
};
use crate::data::NormalizedDataset;
use crate::metrics::BlockingStats;
use crate::types::BlockKey;

/// A group of records sharing one blocking key.
///
/// `members` are dataset offsets (positions in the normalized dataset), not
/// record ids; matches translate back to ids when they are emitted.
#[derive(Clone, Debug)]
pub struct Block {
    /// The shared blocking key; chunked slices of an oversized group carry
    /// a `#chunk` suffix.
    pub key: BlockKey,
    /// Dataset offsets of the records in this block.
    pub members: Vec<usize>,
}

impl Block {
    /// Number of unordered candidate pairs this block will evaluate.
    pub fn candidate_pairs(&self) -> u128 {
        let n = self.members.len() as u128;
        n * n.saturating_sub(1) / 2
    }
}

/// Derive the blocking key for one record from its normalized fields.
///
/// Strategies, first applicable wins:
/// 1. postal + street: `"{plz}|{street}"`
/// 2. postal only: `"plz|{plz}"`
/// 3. street only: `"str|{street}"`
/// 4. no address: `"phon|{given_phon}|{surname_phon}"`
pub fn blocking_key(
    postal_code: &str,
    street: &str,
    given_phon: &str,
    surname_phon: &str,
) -> BlockKey {
    match (!postal_code.is_empty(), !street.is_empty()) {
        (true, true) => format!("{postal_code}{KEY_SEPARATOR}{street}"),
        (true, false) => format!("{KEY_PREFIX_PLZ_ONLY}{KEY_SEPARATOR}{postal_code}"),
        (false, true) => format!("{KEY_PREFIX_STREET_ONLY}{KEY_SEPARATOR}{street}"),
        (false, false) => format!(
            "{KEY_PREFIX_PHONETIC}{KEY_SEPARATOR}{given_phon}{KEY_SEPARATOR}{surname_phon}"
        ),
    }
}

/// Group the dataset into blocks, dropping singleton groups and chunking
/// oversized ones.
///
/// Chunking a group into consecutive slices of at most `max_block_size`
/// records bounds the per-block work at roughly `max_block_size² / 2` pair
/// evaluations. A true duplicate pair split across two chunks is missed;
/// that precision loss is the accepted price for bounded throughput on
/// degenerate keys.
pub fn build_blocks(dataset: &NormalizedDataset, max_block_size: usize) -> Vec<Block> {
    let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (offset, record) in dataset.records().iter().enumerate() {
        groups
            .entry(record.blocking_key.as_str())
            .or_default()
            .push(offset);
    }

    let mut blocks = Vec::new();
    let mut singleton_groups = 0usize;
    let mut chunked_groups = 0usize;
    for (key, members) in groups {
        if members.len() < 2 {
            singleton_groups += 1;
            continue;
        }
        if members.len() <= max_block_size {
            blocks.push(Block {
                key: key.to_string(),
                members,
            });
            continue;
        }
        chunked_groups += 1;
        for (chunk_idx, chunk) in members.chunks(max_block_size).enumerate() {
            if chunk.len() < 2 {
                continue;
            }
            blocks.push(Block {
                key: format!("{key}#chunk{chunk_idx}"),
                members: chunk.to_vec(),
            });
        }
    }

    let stats = BlockingStats::from_blocks(dataset.len(), &blocks);
    info!(
        records = dataset.len(),
        blocks = blocks.len(),
        blocked_records = stats.blocked_records,
        largest_block = stats.largest_block,
        reduction_pct = stats.reduction_ratio() * 100.0,
        "blocking complete"
    );
    debug!(singleton_groups, chunked_groups, "blocking detail");
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NormalizedDataset, Record};

    fn record(id: usize, postal: Option<&str>, street: Option<&str>) -> Record {
        Record {
            id,
            given_name: Some("Hans".into()),
            surname: Some("Meyer".into()),
            postal_code: postal.map(String::from),
            street: street.map(String::from),
            ..Record::default()
        }
    }

    #[test]
    fn strategies_apply_in_order() {
        assert_eq!(blocking_key("8000", "hauptstrasse", "068", "67"), "8000|hauptstrasse");
        assert_eq!(blocking_key("8000", "", "068", "67"), "plz|8000");
        assert_eq!(blocking_key("", "hauptstrasse", "068", "67"), "str|hauptstrasse");
        assert_eq!(blocking_key("", "", "068", "67"), "phon|068|67");
    }

    #[test]
    fn singleton_groups_are_dropped() {
        let raw = vec![
            record(0, Some("8000"), Some("Hauptstrasse")),
            record(1, Some("8000"), Some("Hauptstrasse")),
            record(2, Some("9999"), Some("Einzelgasse")),
        ];
        let dataset = NormalizedDataset::from_records(&raw);
        let blocks = build_blocks(&dataset, 10);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].members, vec![0, 1]);
    }

    #[test]
    fn address_less_records_land_in_phonetic_buckets() {
        let raw = vec![record(0, None, None), record(1, None, None)];
        let dataset = NormalizedDataset::from_records(&raw);
        let blocks = build_blocks(&dataset, 10);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].key.starts_with("phon|"));
    }

    #[test]
    fn oversized_groups_chunk_and_drop_singleton_tails() {
        let raw: Vec<Record> = (0..7)
            .map(|id| record(id, Some("8000"), Some("Hauptstrasse")))
            .collect();
        let dataset = NormalizedDataset::from_records(&raw);
        let blocks = build_blocks(&dataset, 3);
        // 7 records chunk into 3 + 3 + 1; the singleton tail is dropped.
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|block| block.members.len() <= 3));
        assert!(blocks.iter().all(|block| block.members.len() >= 2));
        assert!(blocks[0].key.ends_with("#chunk0"));
        assert!(blocks[1].key.ends_with("#chunk1"));
    }

    #[test]
    fn candidate_pairs_counts_unordered_pairs() {
        let block = Block {
            key: "plz|8000".into(),
            members: vec![0, 1, 2, 3],
        };
        assert_eq!(block.candidate_pairs(), 6);
    }
}
