//! Derived criterion sets and the fact predicates built on them

use rustc_hash::{FxHashMap, FxHashSet};

use super::StatementSequence;
use crate::shared::models::PointId;

/// Extension relation: point → points that may extend a match headed by it
pub type ExtensionMap = FxHashMap<PointId, FxHashSet<PointId>>;

/// Sets derived from one group of sequential criteria.
///
/// - api set: every point of every criterion
/// - head / tail sets: first / last point of each criterion
/// - follow set: point → suffixes that may follow it; built by stripping
///   heads recursively, so a suffix is registered under every point that
///   precedes it in any criterion
#[derive(Debug, Clone, Default)]
pub struct CriterionSets {
    criteria: Vec<StatementSequence>,
    api_set: FxHashSet<PointId>,
    head_set: FxHashSet<PointId>,
    tail_set: FxHashSet<PointId>,
    follow_set: FxHashMap<PointId, FxHashSet<StatementSequence>>,
    extension: ExtensionMap,
}

impl CriterionSets {
    /// Empty or duplicate criteria are ignored.
    pub fn new(criteria: impl IntoIterator<Item = StatementSequence>) -> Self {
        let mut sets = Self::default();
        for sc in criteria {
            if sc.is_empty() || sets.criteria.contains(&sc) {
                continue;
            }
            let points = sc.points();
            sets.api_set.extend(points.iter().copied());
            sets.head_set.extend(sc.head());
            sets.tail_set.extend(sc.tail());
            sets.add_to_follow_set(points);
            sets.criteria.push(sc);
        }
        sets
    }

    fn add_to_follow_set(&mut self, points: &[PointId]) {
        let mut rest = points;
        while rest.len() >= 2 {
            let follow = StatementSequence::from_points(&rest[1..]);
            self.follow_set.entry(rest[0]).or_default().insert(follow);
            rest = &rest[1..];
        }
    }

    pub fn set_extension(&mut self, extension: ExtensionMap) {
        self.extension = extension;
    }

    pub fn has_extension(&self) -> bool {
        !self.extension.is_empty()
    }

    pub fn extension(&self) -> &ExtensionMap {
        &self.extension
    }

    pub fn criteria(&self) -> &[StatementSequence] {
        &self.criteria
    }

    pub fn api_set(&self) -> &FxHashSet<PointId> {
        &self.api_set
    }

    pub fn head_set(&self) -> &FxHashSet<PointId> {
        &self.head_set
    }

    pub fn tail_set(&self) -> &FxHashSet<PointId> {
        &self.tail_set
    }

    pub fn follow_set(&self, p: PointId) -> Option<&FxHashSet<StatementSequence>> {
        self.follow_set.get(&p)
    }

    /// Criterion points whose callees are never entered (all but tails)
    pub fn specified_points(&self) -> FxHashSet<PointId> {
        self.api_set
            .iter()
            .copied()
            .filter(|p| !self.tail_set.contains(p))
            .collect()
    }

    pub fn is_criterion_point(&self, p: PointId) -> bool {
        self.api_set.contains(&p)
    }

    pub fn is_head(&self, p: PointId) -> bool {
        self.head_set.contains(&p)
    }

    pub fn is_tail(&self, p: PointId) -> bool {
        self.tail_set.contains(&p)
    }

    pub fn is_literal_criterion(&self, fact: &StatementSequence) -> bool {
        self.criteria.contains(fact)
    }

    /// `fact`'s content is registered as a follower of `p`
    pub fn can_add_head(&self, p: PointId, fact: &StatementSequence) -> bool {
        if fact.is_epsilon() {
            return false;
        }
        self.follow_set
            .get(&p)
            .is_some_and(|follows| follows.contains(fact))
    }

    /// `p` is an extension point of the fact's head.
    ///
    /// Fails for empty facts, facts already containing `p`, and facts headed
    /// by a criterion point that is not a criterion head.
    pub fn can_extend(&self, p: PointId, fact: &StatementSequence) -> bool {
        let Some(head) = fact.head() else {
            return false;
        };
        if fact.contains(p) {
            return false;
        }
        if self.is_criterion_point(head) && !self.is_head(head) {
            return false;
        }
        self.extension
            .get(&head)
            .is_some_and(|ext| ext.contains(&p))
    }

    /// The fact is waiting for `p` to be matched next
    pub fn can_remove_head(&self, p: PointId, fact: &StatementSequence) -> bool {
        fact.head() == Some(p)
    }

    /// Group criteria by tail, groups ordered by first appearance
    pub fn group_by_tail(
        criteria: impl IntoIterator<Item = StatementSequence>,
    ) -> Vec<(PointId, Vec<StatementSequence>)> {
        let mut groups: Vec<(PointId, Vec<StatementSequence>)> = Vec::new();
        for sc in criteria {
            let Some(tail) = sc.tail() else { continue };
            match groups.iter_mut().find(|(t, _)| *t == tail) {
                Some((_, members)) => {
                    if !members.contains(&sc) {
                        members.push(sc);
                    }
                }
                None => groups.push((tail, vec![sc])),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seq(ids: &[u32]) -> StatementSequence {
        StatementSequence::from_points(ids.iter().map(|&i| PointId(i)).collect::<Vec<_>>())
    }

    #[test]
    fn test_derived_sets() {
        let sets = CriterionSets::new(vec![seq(&[1, 2, 3]), seq(&[4, 3])]);
        assert_eq!(sets.api_set().len(), 4);
        assert!(sets.is_head(PointId(1)) && sets.is_head(PointId(4)));
        assert!(sets.is_tail(PointId(3)));
        assert!(!sets.is_tail(PointId(2)));

        let mut specified: Vec<_> = sets.specified_points().into_iter().collect();
        specified.sort();
        assert_eq!(specified, vec![PointId(1), PointId(2), PointId(4)]);
    }

    #[test]
    fn test_follow_set_registers_every_suffix() {
        let sets = CriterionSets::new(vec![seq(&[1, 2, 3])]);
        let follow1 = sets.follow_set(PointId(1)).unwrap();
        assert!(follow1.contains(&seq(&[2, 3])));
        let follow2 = sets.follow_set(PointId(2)).unwrap();
        assert!(follow2.contains(&seq(&[3])));
        assert!(sets.follow_set(PointId(3)).is_none());

        assert!(sets.can_add_head(PointId(2), &seq(&[3])));
        assert!(sets.can_add_head(PointId(1), &seq(&[2, 3])));
        assert!(!sets.can_add_head(PointId(1), &seq(&[3])));
        assert!(!sets.can_add_head(PointId(2), &StatementSequence::Epsilon));
    }

    #[test]
    fn test_single_point_criterion() {
        let sets = CriterionSets::new(vec![seq(&[9])]);
        assert!(sets.is_head(PointId(9)) && sets.is_tail(PointId(9)));
        assert!(sets.follow_set(PointId(9)).is_none());
        assert!(sets.specified_points().is_empty());
    }

    #[test]
    fn test_can_extend() {
        let mut sets = CriterionSets::new(vec![seq(&[1, 2])]);
        let mut ext = ExtensionMap::default();
        ext.entry(PointId(1)).or_default().insert(PointId(10));
        ext.entry(PointId(2)).or_default().insert(PointId(11));
        ext.entry(PointId(10)).or_default().insert(PointId(12));
        sets.set_extension(ext);

        assert!(sets.can_extend(PointId(10), &seq(&[1, 2])));
        // head 2 is a criterion point but not a head
        assert!(!sets.can_extend(PointId(11), &seq(&[2])));
        assert!(sets.can_extend(PointId(12), &seq(&[10, 1, 2])));
        assert!(!sets.can_extend(PointId(10), &seq(&[10, 1, 2])));
        assert!(!sets.can_extend(PointId(10), &StatementSequence::empty()));
    }

    #[test]
    fn test_can_remove_head() {
        let sets = CriterionSets::new(vec![seq(&[1, 2])]);
        assert!(sets.can_remove_head(PointId(1), &seq(&[1, 2])));
        assert!(!sets.can_remove_head(PointId(2), &seq(&[1, 2])));
        assert!(!sets.can_remove_head(PointId(1), &StatementSequence::Epsilon));
    }

    #[test]
    fn test_group_by_tail() {
        let groups = CriterionSets::group_by_tail(vec![
            seq(&[1, 3]),
            seq(&[2, 4]),
            seq(&[5, 3]),
            seq(&[1, 3]),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, PointId(3));
        assert_eq!(groups[0].1, vec![seq(&[1, 3]), seq(&[5, 3])]);
        assert_eq!(groups[1].0, PointId(4));
    }
}
