//! Tailoring domain models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{Result, TailorError};
use crate::features::fact_model::StatementSequence;
use crate::shared::models::{MethodId, PointId};

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TailorState {
    Built,
    BottomUpRunning,
    BottomUpDone,
    TopDownRunning,
    Done,
}

impl TailorState {
    pub fn name(self) -> &'static str {
        match self {
            TailorState::Built => "Built",
            TailorState::BottomUpRunning => "BottomUpRunning",
            TailorState::BottomUpDone => "BottomUpDone",
            TailorState::TopDownRunning => "TopDownRunning",
            TailorState::Done => "Done",
        }
    }

    /// Fail with `TailorError::State` unless in `expected`
    pub fn ensure(self, expected: TailorState) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(TailorError::State {
                expected: expected.name(),
                found: self.name(),
            })
        }
    }

    /// Next state, or `None` from `Done`
    pub fn next(self) -> Option<TailorState> {
        match self {
            TailorState::Built => Some(TailorState::BottomUpRunning),
            TailorState::BottomUpRunning => Some(TailorState::BottomUpDone),
            TailorState::BottomUpDone => Some(TailorState::TopDownRunning),
            TailorState::TopDownRunning => Some(TailorState::Done),
            TailorState::Done => None,
        }
    }
}

impl fmt::Display for TailorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tailored program for one criterion group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailoringResult {
    /// Tail shared by every criterion of the group
    pub tail: PointId,
    /// Criteria as matched points, head first
    pub criteria: Vec<Vec<PointId>>,
    /// Method → kept statements in body order
    pub methods: BTreeMap<MethodId, Vec<PointId>>,
}

impl TailoringResult {
    pub fn new(tail: PointId, criteria: &[StatementSequence]) -> Self {
        Self {
            tail,
            criteria: criteria.iter().map(|c| c.points().to_vec()).collect(),
            methods: BTreeMap::new(),
        }
    }

    /// An empty result means no criterion is feasible (for a sound ICFG)
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.methods.values().map(Vec::len).sum()
    }

    pub fn contains(&self, p: PointId) -> bool {
        self.methods.values().any(|points| points.contains(&p))
    }

    /// All kept statements, method order then body order
    pub fn points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.methods.values().flatten().copied()
    }
}
