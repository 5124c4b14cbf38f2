//! Ordered-sequence dataflow fact

use std::fmt;
use std::sync::Arc;

use crate::features::ifds::DataflowFact;
use crate::shared::models::PointId;

/// Partial match of a sequential criterion.
///
/// `Seq` holds the matched call sites, head first. The IFDS zero value is
/// the empty `Seq`. `Epsilon` is a distinct variant meaning "match
/// completed" and is never equal to any `Seq`, the empty one included.
///
/// Sequences are immutable; `add_head`/`remove_head` build new values and
/// the point slice is shared between clones.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementSequence {
    Epsilon,
    Seq(Arc<[PointId]>),
}

impl StatementSequence {
    /// The canonical empty sequence (IFDS zero value)
    pub fn empty() -> Self {
        StatementSequence::Seq(Arc::from(Vec::new()))
    }

    pub fn epsilon() -> Self {
        StatementSequence::Epsilon
    }

    pub fn from_points(points: impl Into<Vec<PointId>>) -> Self {
        StatementSequence::Seq(Arc::from(points.into()))
    }

    /// Matched points, head first; empty for `Epsilon`
    pub fn points(&self) -> &[PointId] {
        match self {
            StatementSequence::Epsilon => &[],
            StatementSequence::Seq(points) => points,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, StatementSequence::Epsilon)
    }

    /// No matched points (empty `Seq` or `Epsilon`)
    pub fn is_empty(&self) -> bool {
        self.points().is_empty()
    }

    pub fn len(&self) -> usize {
        self.points().len()
    }

    pub fn head(&self) -> Option<PointId> {
        self.points().first().copied()
    }

    pub fn tail(&self) -> Option<PointId> {
        self.points().last().copied()
    }

    pub fn contains(&self, p: PointId) -> bool {
        self.points().contains(&p)
    }

    /// New sequence with `p` prepended
    pub fn add_head(&self, p: PointId) -> Self {
        let mut points = Vec::with_capacity(self.len() + 1);
        points.push(p);
        points.extend_from_slice(self.points());
        Self::from_points(points)
    }

    /// New sequence without its head; a single-element sequence yields
    /// `Epsilon`. Empty sequences and `Epsilon` are returned unchanged.
    pub fn remove_head(&self) -> Self {
        match self.len() {
            0 => self.clone(),
            1 => StatementSequence::Epsilon,
            _ => Self::from_points(&self.points()[1..]),
        }
    }

    /// Same matched points, ignoring the `Epsilon` distinction
    pub fn same_content(&self, other: &Self) -> bool {
        self.points() == other.points()
    }

    /// `self` is a suffix of `other` and `other` is strictly longer
    pub fn is_strict_suffix_of(&self, other: &Self) -> bool {
        other.len() > self.len() && other.points().ends_with(self.points())
    }
}

impl DataflowFact for StatementSequence {
    fn is_zero(&self) -> bool {
        matches!(self, StatementSequence::Seq(points) if points.is_empty())
    }

    fn zero() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for StatementSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementSequence::Epsilon => write!(f, "Epsilon"),
            StatementSequence::Seq(points) => f.debug_list().entries(points.iter()).finish(),
        }
    }
}

impl From<Vec<PointId>> for StatementSequence {
    fn from(points: Vec<PointId>) -> Self {
        Self::from_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seq(ids: &[u32]) -> StatementSequence {
        StatementSequence::from_points(ids.iter().map(|&i| PointId(i)).collect::<Vec<_>>())
    }

    #[test]
    fn test_epsilon_distinct_from_empty() {
        assert_ne!(StatementSequence::Epsilon, StatementSequence::empty());
        assert!(StatementSequence::Epsilon.is_empty());
        assert!(!StatementSequence::Epsilon.is_zero());
        assert!(StatementSequence::empty().is_zero());
        assert_eq!(StatementSequence::empty(), seq(&[]));
    }

    #[test]
    fn test_remove_head_boundary() {
        assert_eq!(seq(&[7]).remove_head(), StatementSequence::Epsilon);
        assert_eq!(seq(&[1, 2, 3]).remove_head(), seq(&[2, 3]));
        assert_eq!(StatementSequence::Epsilon.remove_head(), StatementSequence::Epsilon);
        assert!(StatementSequence::empty().remove_head().is_zero());
    }

    #[test]
    fn test_add_head_on_zero() {
        let s = StatementSequence::zero().add_head(PointId(4));
        assert_eq!(s, seq(&[4]));
        assert_eq!(s.head(), Some(PointId(4)));
        assert_eq!(s.tail(), Some(PointId(4)));
    }

    #[test]
    fn test_strict_suffix() {
        assert!(seq(&[2, 3]).is_strict_suffix_of(&seq(&[1, 2, 3])));
        assert!(!seq(&[1, 2, 3]).is_strict_suffix_of(&seq(&[1, 2, 3])));
        assert!(!seq(&[1, 2]).is_strict_suffix_of(&seq(&[1, 2, 3])));
        assert!(StatementSequence::empty().is_strict_suffix_of(&seq(&[1])));
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", StatementSequence::Epsilon), "Epsilon");
        assert_eq!(format!("{:?}", seq(&[1, 2])), "[PointId(1), PointId(2)]");
    }

    proptest! {
        #[test]
        fn prop_add_remove_roundtrip(ids in proptest::collection::vec(0u32..64, 1..8), p in 0u32..64) {
            let f = seq(&ids);
            prop_assert_eq!(f.add_head(PointId(p)).remove_head(), f);
        }

        #[test]
        fn prop_epsilon_never_equals_seq(ids in proptest::collection::vec(0u32..64, 0..8)) {
            prop_assert_ne!(StatementSequence::Epsilon, seq(&ids));
        }

        #[test]
        fn prop_add_head_grows_by_one(ids in proptest::collection::vec(0u32..64, 0..8), p in 0u32..64) {
            let f = seq(&ids);
            let g = f.add_head(PointId(p));
            prop_assert_eq!(g.len(), f.len() + 1);
            prop_assert_eq!(g.head(), Some(PointId(p)));
            prop_assert!(f.is_strict_suffix_of(&g));
        }
    }
}
