//! Block runner: drives the matcher over every block, in parallel across
//! blocks. This is the only place concurrency lives; within a block all
//! work is single-threaded and synchronous.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::blocking::{build_blocks, Block};
use crate::config::MatcherConfig;
use crate::constants::runner::{PROGRESS_LOG_INTERVAL, SEQUENTIAL_BLOCK_LIMIT};
use crate::data::NormalizedDataset;
use crate::errors::DedupError;
use crate::matcher::match_block;
use crate::metrics::BlockingStats;
use crate::score::{better_of, Match};
use crate::types::RecordId;

/// Cooperative cancellation signal checked between blocks.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Workers stop picking up new blocks; matches
    /// already produced are kept.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Result of one matching run.
#[derive(Clone, Debug)]
pub struct MatchReport {
    /// Deduplicated matches, unordered. Callers needing a deterministic
    /// order sort by `(id_a, id_b)`.
    pub matches: Vec<Match>,
    /// Blocks dropped because their worker panicked.
    pub failed_blocks: usize,
    /// `false` when cancellation left blocks unattempted.
    pub complete: bool,
    /// Statistics of the blocking pass that fed this run.
    pub blocking: BlockingStats,
}

/// Drives the full pipeline: normalization, blocking, per-block matching,
/// and match collection. Configuration is validated once at construction
/// and shared immutably with every worker.
#[derive(Clone, Debug)]
pub struct MatchRunner {
    config: MatcherConfig,
}

impl MatchRunner {
    /// Create a runner, failing fast on invalid configuration.
    pub fn new(config: MatcherConfig) -> Result<Self, DedupError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Normalize raw records and run the matcher over them.
    pub fn run(&self, records: &[crate::data::Record]) -> MatchReport {
        self.run_with_cancel(records, &CancelToken::new())
    }

    /// Like [`MatchRunner::run`] with a caller-owned cancellation token.
    pub fn run_with_cancel(
        &self,
        records: &[crate::data::Record],
        cancel: &CancelToken,
    ) -> MatchReport {
        let started = Instant::now();
        let dataset = NormalizedDataset::from_records(records);
        debug!(
            records = dataset.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset normalized"
        );
        self.run_dataset(&dataset, cancel)
    }

    /// Run the matcher over an already-normalized dataset.
    pub fn run_dataset(&self, dataset: &NormalizedDataset, cancel: &CancelToken) -> MatchReport {
        let started = Instant::now();
        let blocks = build_blocks(dataset, self.config.max_block_size);
        let blocking = BlockingStats::from_blocks(dataset.len(), &blocks);

        let workers = self.config.effective_workers();
        let parallel =
            self.config.use_parallel && workers > 1 && blocks.len() > SEQUENTIAL_BLOCK_LIMIT;
        info!(
            blocks = blocks.len(),
            workers = if parallel { workers } else { 1 },
            parallel,
            "processing blocks"
        );

        let outcome = if parallel {
            self.process_parallel(dataset, &blocks, workers, cancel)
        } else {
            self.process_sequential(dataset, &blocks, cancel)
        };

        let report = MatchReport {
            matches: outcome.matches,
            failed_blocks: outcome.failed,
            complete: outcome.attempted == blocks.len(),
            blocking,
        };
        info!(
            matches = report.matches.len(),
            failed_blocks = report.failed_blocks,
            complete = report.complete,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "matching complete"
        );
        report
    }

    fn process_sequential(
        &self,
        dataset: &NormalizedDataset,
        blocks: &[Block],
        cancel: &CancelToken,
    ) -> RunOutcome {
        let mut collector: HashMap<(RecordId, RecordId), Match> = HashMap::new();
        let mut failed = 0usize;
        let mut attempted = 0usize;
        for block in blocks {
            if cancel.is_cancelled() {
                break;
            }
            attempted += 1;
            match run_block_contained(dataset, block, &self.config) {
                Some(matches) => collect_matches(&mut collector, matches, block),
                None => failed += 1,
            }
            if attempted % PROGRESS_LOG_INTERVAL == 0 {
                debug!(attempted, total = blocks.len(), "block progress");
            }
        }
        RunOutcome {
            matches: collector.into_values().collect(),
            failed,
            attempted,
        }
    }

    fn process_parallel(
        &self,
        dataset: &NormalizedDataset,
        blocks: &[Block],
        workers: usize,
        cancel: &CancelToken,
    ) -> RunOutcome {
        let next_block = AtomicUsize::new(0);
        let attempted = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let (sink, results) = mpsc::channel::<(usize, Vec<Match>)>();

        let mut collector: HashMap<(RecordId, RecordId), Match> = HashMap::new();
        thread::scope(|scope| {
            for _ in 0..workers {
                let sink = sink.clone();
                let next_block = &next_block;
                let attempted = &attempted;
                let failed = &failed;
                let config = &self.config;
                scope.spawn(move || {
                    loop {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let idx = next_block.fetch_add(1, Ordering::Relaxed);
                        if idx >= blocks.len() {
                            break;
                        }
                        attempted.fetch_add(1, Ordering::Relaxed);
                        match run_block_contained(dataset, &blocks[idx], config) {
                            Some(matches) => {
                                if !matches.is_empty() && sink.send((idx, matches)).is_err() {
                                    break;
                                }
                            }
                            None => {
                                failed.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        let done = idx + 1;
                        if done % PROGRESS_LOG_INTERVAL == 0 {
                            debug!(done, total = blocks.len(), "block progress");
                        }
                    }
                });
            }
            drop(sink);
            for (idx, matches) in results {
                collect_matches(&mut collector, matches, &blocks[idx]);
            }
        });

        RunOutcome {
            matches: collector.into_values().collect(),
            failed: failed.load(Ordering::Relaxed),
            attempted: attempted.load(Ordering::Relaxed),
        }
    }
}

struct RunOutcome {
    matches: Vec<Match>,
    failed: usize,
    attempted: usize,
}

/// Run one block with panic containment. A panicking block is dropped and
/// reported; processing continues with the remaining blocks.
fn run_block_contained(
    dataset: &NormalizedDataset,
    block: &Block,
    config: &MatcherConfig,
) -> Option<Vec<Match>> {
    match catch_unwind(AssertUnwindSafe(|| match_block(dataset, block, config))) {
        Ok(matches) => {
            if matches.is_empty() {
                debug!(block = %block.key, size = block.members.len(), "block produced no candidates");
            }
            Some(matches)
        }
        Err(_) => {
            warn!(block = %block.key, size = block.members.len(), "block worker panicked; block dropped");
            None
        }
    }
}

/// Merge a block's matches into the deduplicated collector. A pair seen
/// twice (possible across chunks of a split block) keeps the
/// higher-ranking classification.
fn collect_matches(
    collector: &mut HashMap<(RecordId, RecordId), Match>,
    matches: Vec<Match>,
    block: &Block,
) {
    let count = matches.len();
    for m in matches {
        collector
            .entry((m.id_a, m.id_b))
            .and_modify(|existing| *existing = better_of(*existing, m))
            .or_insert(m);
    }
    debug!(block = %block.key, matches = count, "block collected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::score::MatchType;

    fn household(id_base: usize, street: &str) -> Vec<Record> {
        vec![
            Record {
                id: id_base,
                given_name: Some("Max".into()),
                surname: Some("Müller".into()),
                street: Some(street.into()),
                postal_code: Some("8000".into()),
                birth_year: Some(1980),
                ..Record::default()
            },
            Record {
                id: id_base + 1,
                given_name: Some("Max".into()),
                surname: Some("Mueller".into()),
                street: Some(street.into()),
                postal_code: Some("8000".into()),
                birth_year: Some(1980),
                ..Record::default()
            },
        ]
    }

    #[test]
    fn rejects_invalid_configuration_at_construction() {
        let config = MatcherConfig {
            fuzzy_threshold: 2.0,
            ..MatcherConfig::default()
        };
        assert!(MatchRunner::new(config).is_err());
    }

    #[test]
    fn sequential_run_finds_the_duplicate_pair() {
        let runner = MatchRunner::new(MatcherConfig::default()).expect("valid config");
        let report = runner.run(&household(0, "Hauptstrasse"));
        assert!(report.complete);
        assert_eq!(report.failed_blocks, 0);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].match_type, MatchType::ExactNormal);
    }

    #[test]
    fn parallel_run_matches_sequential_results() {
        let mut records = Vec::new();
        for i in 0..40 {
            records.extend(household(i * 2, &format!("Gasse{i}")));
        }

        let sequential = MatchRunner::new(MatcherConfig {
            use_parallel: false,
            ..MatcherConfig::default()
        })
        .expect("valid config");
        let parallel = MatchRunner::new(MatcherConfig {
            use_parallel: true,
            workers: Some(4),
            ..MatcherConfig::default()
        })
        .expect("valid config");

        let mut seq_matches = sequential.run(&records).matches;
        let mut par_matches = parallel.run(&records).matches;
        seq_matches.sort_by_key(|m| (m.id_a, m.id_b));
        par_matches.sort_by_key(|m| (m.id_a, m.id_b));
        assert_eq!(seq_matches.len(), 40);
        assert_eq!(seq_matches, par_matches);
    }

    #[test]
    fn cancelled_run_reports_incomplete() {
        let mut records = Vec::new();
        for i in 0..30 {
            records.extend(household(i * 2, &format!("Gasse{i}")));
        }
        let runner = MatchRunner::new(MatcherConfig {
            use_parallel: false,
            ..MatcherConfig::default()
        })
        .expect("valid config");
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = runner.run_with_cancel(&records, &cancel);
        assert!(!report.complete);
        assert!(report.matches.is_empty());
    }

    #[test]
    fn duplicate_pairs_across_chunks_keep_the_better_type() {
        let mut collector = HashMap::new();
        let block = Block {
            key: "plz|8000#chunk0".into(),
            members: vec![0, 1],
        };
        let fuzzy = Match {
            id_a: 3,
            id_b: 9,
            match_type: MatchType::FuzzyNormal,
            confidence: 88,
        };
        let exact = Match {
            id_a: 3,
            id_b: 9,
            match_type: MatchType::ExactNormal,
            confidence: 93,
        };
        collect_matches(&mut collector, vec![fuzzy], &block);
        collect_matches(&mut collector, vec![exact], &block);
        assert_eq!(collector.len(), 1);
        assert_eq!(collector[&(3, 9)].match_type, MatchType::ExactNormal);
    }

    #[test]
    fn empty_dataset_yields_an_empty_complete_report() {
        let runner = MatchRunner::new(MatcherConfig::default()).expect("valid config");
        let report = runner.run(&[]);
        assert!(report.complete);
        assert!(report.matches.is_empty());
        assert_eq!(report.blocking.block_count, 0);
    }
}
