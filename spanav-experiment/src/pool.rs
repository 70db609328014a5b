//! Stimulus selection per block.
//!
//! Each `(nav_type, difficulty)` key serves its difficulty pool round-robin:
//! an id is not served again until every id in the pool has been served in
//! the current cycle. When a cycle runs out mid-block a new one starts, with
//! ids already picked for this block pushed to the back so a block only
//! repeats an id when the pool is smaller than the block.

use crate::rng::SessionRng;
use spanav_core::{
    BlockSpec, CATCH_STIMULI, Difficulty, NavType, Stimulus, StimulusCatalog, TrialEntry,
};
use std::collections::{HashMap, HashSet};

/// Shuffle passes applied to each candidate partition.
const SHUFFLE_PASSES: usize = 2;

/// Session-wide record of which ids each key has served in its current cycle.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    served: HashMap<BlockSpec, HashSet<String>>,
    cycles: HashMap<BlockSpec, usize>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_served(&self, key: BlockSpec, id: &str) -> bool {
        self.served.get(&key).is_some_and(|ids| ids.contains(id))
    }

    pub fn served_count(&self, key: BlockSpec) -> usize {
        self.served.get(&key).map_or(0, HashSet::len)
    }

    /// Completed cycles (full passes through the pool) for `key`.
    pub fn cycles(&self, key: BlockSpec) -> usize {
        self.cycles.get(&key).copied().unwrap_or(0)
    }

    fn mark(&mut self, key: BlockSpec, id: &str) {
        self.served.entry(key).or_default().insert(id.to_string());
    }

    fn start_new_cycle(&mut self, key: BlockSpec) {
        if let Some(ids) = self.served.get_mut(&key) {
            ids.clear();
        }
        *self.cycles.entry(key).or_default() += 1;
    }
}

/// The ordered slots for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBlock {
    pub spec: BlockSpec,
    pub entries: Vec<TrialEntry>,
    pub expected_len: usize,
}

impl PreparedBlock {
    /// False when the backing pool could not fill the block.
    pub fn is_complete(&self) -> bool {
        self.entries.len() >= self.expected_len
    }

    pub fn shortfall(&self) -> usize {
        self.expected_len.saturating_sub(self.entries.len())
    }

    pub fn catch_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_catch()).count()
    }

    pub fn media(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.media().map(str::to_string))
            .collect()
    }
}

pub struct StimulusPool<'a> {
    catalog: &'a StimulusCatalog,
    usage: &'a mut UsageTracker,
}

impl<'a> StimulusPool<'a> {
    pub fn new(catalog: &'a StimulusCatalog, usage: &'a mut UsageTracker) -> Self {
        Self { catalog, usage }
    }

    /// Regular selections for `spec` with `catch_trials` catch items inserted
    /// at uniformly drawn positions. An empty pool yields an empty block.
    pub fn prepare_block(
        &mut self,
        spec: BlockSpec,
        trials_per_block: usize,
        catch_trials: usize,
        rng: &mut SessionRng,
    ) -> PreparedBlock {
        let catalog = self.catalog;
        let pool = catalog.pool(spec.difficulty);
        if pool.is_empty() {
            tracing::warn!(
                nav_type = %spec.nav_type,
                difficulty = %spec.difficulty,
                "no stimuli for difficulty, block left empty"
            );
            return PreparedBlock {
                spec,
                entries: Vec::new(),
                expected_len: trials_per_block,
            };
        }

        let needed = trials_per_block.saturating_sub(catch_trials);
        let mut entries: Vec<TrialEntry> = self
            .select_regular(spec, pool, needed, rng)
            .into_iter()
            .map(TrialEntry::Regular)
            .collect();

        for item in rng.shuffle(&CATCH_STIMULI).into_iter().take(catch_trials) {
            let at = rng.index_inclusive(entries.len());
            entries.insert(at, TrialEntry::Catch(item));
        }

        tracing::debug!(
            nav_type = %spec.nav_type,
            difficulty = %spec.difficulty,
            entries = entries.len(),
            served_in_cycle = self.usage.served_count(spec),
            "block prepared"
        );

        PreparedBlock {
            spec,
            entries,
            expected_len: trials_per_block,
        }
    }

    fn select_regular(
        &mut self,
        key: BlockSpec,
        pool: &'a [Stimulus],
        needed: usize,
        rng: &mut SessionRng,
    ) -> Vec<Stimulus> {
        let mut selected = Vec::with_capacity(needed);
        let mut picked: HashSet<&'a str> = HashSet::new();

        while selected.len() < needed {
            let fresh: Vec<&'a Stimulus> = pool
                .iter()
                .filter(|s| !self.usage.is_served(key, &s.id))
                .collect();
            if fresh.is_empty() {
                self.usage.start_new_cycle(key);
                continue;
            }

            let (first, again): (Vec<&'a Stimulus>, Vec<&'a Stimulus>) = fresh
                .into_iter()
                .partition(|s| !picked.contains(s.id.as_str()));
            let order: Vec<&'a Stimulus> = mixed(rng, &first)
                .into_iter()
                .chain(mixed(rng, &again))
                .collect();

            for s in order.into_iter().take(needed - selected.len()) {
                self.usage.mark(key, &s.id);
                picked.insert(s.id.as_str());
                selected.push(s.clone());
            }
        }
        selected
    }
}

fn mixed<'s>(rng: &mut SessionRng, items: &[&'s Stimulus]) -> Vec<&'s Stimulus> {
    let mut out = items.to_vec();
    for _ in 0..SHUFFLE_PASSES {
        out = rng.shuffle(&out);
    }
    out
}

/// Navigation frame for practice trial `index`: the first half is
/// egocentric, the rest allocentric.
pub fn practice_nav_type(index: usize, total: usize) -> NavType {
    if index < total / 2 {
        NavType::Egocentric
    } else {
        NavType::Allocentric
    }
}

/// Practice trials cycle through the easy pool by index.
pub fn practice_entries(catalog: &StimulusCatalog, total: usize) -> Vec<(NavType, Option<TrialEntry>)> {
    let pool = catalog.pool(Difficulty::Practice);
    (0..total)
        .map(|i| {
            let entry = (!pool.is_empty()).then(|| TrialEntry::Regular(pool[i % pool.len()].clone()));
            (practice_nav_type(i, total), entry)
        })
        .collect()
}
