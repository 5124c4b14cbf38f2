//! Tag side-table
//!
//! Structural tags live next to the program instead of on it; one table is
//! owned by one tailoring run and dropped with it.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::shared::models::{MethodId, PointId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Touched by the bottom-up pass
    MainReachable,
    /// Non-empty bottom-up result
    BottomUpReachable,
    /// Inside an if/else or switch branch
    Branch,
    /// Inside a loop, or (for methods) reachable from a call in a loop
    IntraCycle,
    /// On, or reachable from, a recursive call-graph component
    InterCycle,
}

impl Tag {
    fn bit(self) -> u8 {
        match self {
            Tag::MainReachable => 1,
            Tag::BottomUpReachable => 1 << 1,
            Tag::Branch => 1 << 2,
            Tag::IntraCycle => 1 << 3,
            Tag::InterCycle => 1 << 4,
        }
    }
}

/// Small set of tags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagSet(u8);

impl TagSet {
    pub fn contains(self, tag: Tag) -> bool {
        self.0 & tag.bit() != 0
    }

    /// Returns true when the tag was not present yet
    pub fn insert(&mut self, tag: Tag) -> bool {
        let fresh = !self.contains(tag);
        self.0 |= tag.bit();
        fresh
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Default)]
pub struct TagTable {
    points: FxHashMap<PointId, TagSet>,
    methods: FxHashMap<MethodId, TagSet>,
    /// Allocation statement → its constructor call (`None` when not found)
    constructor_calls: FxHashMap<PointId, Option<PointId>>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag_point(&mut self, p: PointId, tag: Tag) -> bool {
        self.points.entry(p).or_default().insert(tag)
    }

    pub fn tag_method(&mut self, m: MethodId, tag: Tag) -> bool {
        self.methods.entry(m).or_default().insert(tag)
    }

    pub fn point_has(&self, p: PointId, tag: Tag) -> bool {
        self.points.get(&p).is_some_and(|t| t.contains(tag))
    }

    pub fn method_has(&self, m: MethodId, tag: Tag) -> bool {
        self.methods.get(&m).is_some_and(|t| t.contains(tag))
    }

    pub fn point_tags(&self, p: PointId) -> TagSet {
        self.points.get(&p).copied().unwrap_or_default()
    }

    pub fn points_with(&self, tag: Tag) -> FxHashSet<PointId> {
        self.points
            .iter()
            .filter(|(_, t)| t.contains(tag))
            .map(|(p, _)| *p)
            .collect()
    }

    pub fn set_constructor_call(&mut self, alloc: PointId, call: Option<PointId>) {
        self.constructor_calls.insert(alloc, call);
    }

    /// `None`: never tagged; `Some(None)`: tagged, no constructor call found
    pub fn constructor_call(&self, alloc: PointId) -> Option<Option<PointId>> {
        self.constructor_calls.get(&alloc).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_set() {
        let mut set = TagSet::default();
        assert!(set.is_empty());
        assert!(set.insert(Tag::Branch));
        assert!(!set.insert(Tag::Branch));
        assert!(set.contains(Tag::Branch));
        assert!(!set.contains(Tag::IntraCycle));
    }

    #[test]
    fn test_points_and_methods_are_separate() {
        let mut table = TagTable::new();
        table.tag_point(PointId(3), Tag::IntraCycle);
        table.tag_method(MethodId(3), Tag::InterCycle);
        assert!(table.point_has(PointId(3), Tag::IntraCycle));
        assert!(!table.point_has(PointId(3), Tag::InterCycle));
        assert!(table.method_has(MethodId(3), Tag::InterCycle));
        assert_eq!(table.points_with(Tag::IntraCycle).len(), 1);
    }

    #[test]
    fn test_constructor_call_states() {
        let mut table = TagTable::new();
        assert_eq!(table.constructor_call(PointId(1)), None);
        table.set_constructor_call(PointId(1), None);
        assert_eq!(table.constructor_call(PointId(1)), Some(None));
        table.set_constructor_call(PointId(2), Some(PointId(5)));
        assert_eq!(table.constructor_call(PointId(2)), Some(Some(PointId(5))));
    }
}
