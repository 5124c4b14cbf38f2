//! Bottom-up result cache with fact-set interning
//!
//! Many points carry the same set of partial matches (every statement of a
//! straight-line stretch, for instance). Sets are hash-consed: the canonical
//! key is the sorted fact vector, and equal sets share one `Arc`.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::features::fact_model::StatementSequence;
use crate::features::ifds::IFDSSolverResult;
use crate::shared::models::PointId;

pub type FactSet = FxHashSet<StatementSequence>;

/// Interning counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InternStats {
    /// Distinct sets stored
    pub sets: usize,
    pub lookups: usize,
    /// Lookups answered by an already stored set
    pub hits: usize,
}

/// Content-addressed table of fact sets
#[derive(Debug, Default)]
pub struct FactSetInterner {
    table: FxHashMap<Vec<StatementSequence>, Arc<FactSet>>,
    empty: Arc<FactSet>,
    stats: InternStats,
}

impl FactSetInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared instance of `set`
    pub fn intern(&mut self, set: FactSet) -> Arc<FactSet> {
        self.stats.lookups += 1;
        let mut key: Vec<StatementSequence> = set.iter().cloned().collect();
        key.sort();
        if let Some(shared) = self.table.get(&key) {
            self.stats.hits += 1;
            return Arc::clone(shared);
        }
        let shared = Arc::new(set);
        self.table.insert(key, Arc::clone(&shared));
        self.stats.sets = self.table.len();
        shared
    }

    pub fn empty(&self) -> Arc<FactSet> {
        Arc::clone(&self.empty)
    }

    pub fn stats(&self) -> InternStats {
        self.stats
    }
}

/// Point → interned bottom-up facts (zero excluded)
#[derive(Debug, Default)]
pub struct ResultCache {
    interner: FactSetInterner,
    results: FxHashMap<PointId, Arc<FactSet>>,
}

impl ResultCache {
    /// Cache the solver results at `points`; points without facts are skipped.
    pub fn from_solver(
        result: &IFDSSolverResult<StatementSequence>,
        points: impl IntoIterator<Item = PointId>,
    ) -> Self {
        let mut cache = Self::default();
        for p in points {
            let facts = result.results_at(p);
            if !facts.is_empty() {
                cache.insert(p, facts);
            }
        }
        tracing::debug!(
            points = cache.results.len(),
            sets = cache.interner.stats().sets,
            hits = cache.interner.stats().hits,
            "bottom-up results cached"
        );
        cache
    }

    pub fn insert(&mut self, p: PointId, facts: FactSet) {
        let shared = self.interner.intern(facts);
        self.results.insert(p, shared);
    }

    /// Facts at `p`; the empty set for unreached points
    pub fn ifds_results_at(&self, p: PointId) -> Arc<FactSet> {
        match self.results.get(&p) {
            Some(facts) => Arc::clone(facts),
            None => self.interner.empty(),
        }
    }

    /// Points with at least one non-zero fact
    pub fn reached_points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.results.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn intern_stats(&self) -> InternStats {
        self.interner.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seq(ids: &[u32]) -> StatementSequence {
        StatementSequence::from_points(ids.iter().map(|&i| PointId(i)).collect::<Vec<_>>())
    }

    fn set(facts: &[StatementSequence]) -> FactSet {
        facts.iter().cloned().collect()
    }

    #[test]
    fn test_equal_sets_share_storage() {
        let mut interner = FactSetInterner::new();
        let a = interner.intern(set(&[seq(&[1, 2]), seq(&[2])]));
        let b = interner.intern(set(&[seq(&[2]), seq(&[1, 2])]));
        let c = interner.intern(set(&[seq(&[2])]));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(
            interner.stats(),
            InternStats {
                sets: 2,
                lookups: 3,
                hits: 1
            }
        );
    }

    #[test]
    fn test_epsilon_is_distinct_key() {
        let mut interner = FactSetInterner::new();
        let eps = interner.intern(set(&[StatementSequence::Epsilon]));
        let empty = interner.intern(set(&[StatementSequence::empty()]));
        assert!(!Arc::ptr_eq(&eps, &empty));
    }

    #[test]
    fn test_unknown_point_is_empty() {
        let mut cache = ResultCache::default();
        cache.insert(PointId(1), set(&[seq(&[3])]));
        cache.insert(PointId(2), set(&[seq(&[3])]));

        assert!(cache.ifds_results_at(PointId(9)).is_empty());
        assert!(Arc::ptr_eq(
            &cache.ifds_results_at(PointId(1)),
            &cache.ifds_results_at(PointId(2))
        ));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.intern_stats().sets, 1);
    }
}
