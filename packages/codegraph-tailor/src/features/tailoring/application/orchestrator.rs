//! Tailoring Orchestrator
//!
//! Runs the whole pipeline for one criterion group (criteria sharing a
//! tail) and owns everything the run derives: criterion sets, the blocked
//! ICFG, the tag side-table and the bottom-up result cache.
//!
//! # Lifecycle
//! ```text
//! Built ──run_bottom_up──▶ BottomUpRunning ──▶ BottomUpDone
//!       ──run_top_down───▶ TopDownRunning  ──▶ Done
//! ```
//! Queries (`result`, `bottom_up_results_at`) require `Done`.
//!
//! # Usage
//! ```rust,ignore
//! let mut orchestrator = TailoringOrchestrator::new(&program, &program, &config, tail, &criteria)?;
//! let result = orchestrator.run()?;
//! ```

use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::time::Instant;

use super::super::domain::{TailorState, TailoringResult};
use super::super::infrastructure::{
    derive_seeds, project, solve_bottom_up, solve_top_down, FactSet, ResultCache,
};
use crate::config::TailorConfig;
use crate::errors::{Result, TailorError};
use crate::features::cycle_analysis::{IntraCycles, RedirectionPlan};
use crate::features::extension::ExtensionFinder;
use crate::features::fact_model::{CriterionSets, StatementSequence};
use crate::features::icfg::BlockedIcfg;
use crate::features::tagging::{tag_cycles, tag_methods, Tag, TagTable};
use crate::shared::models::PointId;
use crate::shared::ports::{PointsToProvider, ProgramGraph};

pub struct TailoringOrchestrator<'a> {
    config: &'a TailorConfig,
    tail: PointId,
    sets: CriterionSets,
    icfg: BlockedIcfg<'a>,
    tags: TagTable,
    state: TailorState,
    bottom_up: Option<ResultCache>,
    result: Option<TailoringResult>,
}

impl<'a> TailoringOrchestrator<'a> {
    /// Derive criterion sets, build the blocked ICFG and, when enabled,
    /// discover the extension relation.
    ///
    /// Fails when extension discovery meets an allocation site without a
    /// constructor call.
    pub fn new(
        program: &'a dyn ProgramGraph,
        pts: &'a dyn PointsToProvider,
        config: &'a TailorConfig,
        tail: PointId,
        criteria: &[StatementSequence],
    ) -> Result<Self> {
        let started = Instant::now();
        let mut sets = CriterionSets::new(criteria.iter().cloned());
        let icfg = build_icfg(program, &sets, config);

        let mut tags = TagTable::new();
        if config.extend_sc {
            tag_methods(program, &mut tags);
            tag_cycles(&icfg, &mut tags);
            let extension = ExtensionFinder::new(&icfg, pts, &sets, &tags, config).find()?;
            sets.set_extension(extension);
        }

        tracing::info!(
            tail = %tail,
            criteria = sets.criteria().len(),
            extension_points = sets.extension().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tailoring run prepared"
        );
        Ok(Self {
            config,
            tail,
            sets,
            icfg,
            tags,
            state: TailorState::Built,
            bottom_up: None,
            result: None,
        })
    }

    /// Both passes, then the result
    pub fn run(&mut self) -> Result<&TailoringResult> {
        self.run_bottom_up()?;
        self.run_top_down()?;
        self.result()
    }

    pub fn run_bottom_up(&mut self) -> Result<()> {
        self.state.ensure(TailorState::Built)?;
        self.state = TailorState::BottomUpRunning;

        let solved = solve_bottom_up(&self.icfg, &self.sets);
        for p in solved.visited_points() {
            self.tags.tag_point(p, Tag::MainReachable);
        }
        let cache = ResultCache::from_solver(&solved, solved.visited_points());
        for p in cache.reached_points() {
            self.tags.tag_point(p, Tag::BottomUpReachable);
        }
        let interned = cache.intern_stats();
        tracing::debug!(
            points = cache.len(),
            distinct_sets = interned.sets,
            hits = interned.hits,
            "bottom-up results cached"
        );
        self.bottom_up = Some(cache);

        self.state = TailorState::BottomUpDone;
        Ok(())
    }

    pub fn run_top_down(&mut self) -> Result<()> {
        self.state.ensure(TailorState::BottomUpDone)?;
        let Some(cache) = self.bottom_up.as_ref() else {
            return Err(TailorError::State {
                expected: TailorState::BottomUpDone.name(),
                found: self.state.name(),
            });
        };
        self.state = TailorState::TopDownRunning;

        let entry = self.icfg.entry_method();
        let mut found = FxHashSet::default();
        for &p in self.icfg.start_points_of(entry) {
            found.extend(cache.ifds_results_at(p).iter().cloned());
        }
        let seeds = derive_seeds(&found, &self.sets);
        if seeds.is_empty() {
            tracing::debug!(tail = %self.tail, "no complete match reaches the entry method");
        }

        let reachable = self.tags.points_with(Tag::BottomUpReachable);
        let solved = solve_top_down(&self.icfg, &self.sets, self.config, seeds, &reachable)?;

        let mut result = TailoringResult::new(self.tail, self.sets.criteria());
        result.methods = project(&self.icfg, cache, &solved);
        tracing::info!(
            tail = %self.tail,
            methods = result.methods.len(),
            points = result.point_count(),
            "tailoring done"
        );
        self.result = Some(result);

        self.state = TailorState::Done;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> TailorState {
        self.state
    }

    pub fn tail(&self) -> PointId {
        self.tail
    }

    pub fn criterion_sets(&self) -> &CriterionSets {
        &self.sets
    }

    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    pub fn result(&self) -> Result<&TailoringResult> {
        self.state.ensure(TailorState::Done)?;
        self.result.as_ref().ok_or(TailorError::State {
            expected: TailorState::Done.name(),
            found: self.state.name(),
        })
    }

    pub fn into_result(self) -> Result<TailoringResult> {
        self.state.ensure(TailorState::Done)?;
        self.result.ok_or(TailorError::State {
            expected: TailorState::Done.name(),
            found: self.state.name(),
        })
    }

    /// Bottom-up facts at `p` (shared, zero excluded)
    pub fn bottom_up_results_at(&self, p: PointId) -> Result<Arc<FactSet>> {
        self.state.ensure(TailorState::Done)?;
        self.bottom_up
            .as_ref()
            .map(|cache| cache.ifds_results_at(p))
            .ok_or(TailorError::State {
                expected: TailorState::Done.name(),
                found: self.state.name(),
            })
    }
}

/// Blocked ICFG for `sets`; unless cycles are retained, loops are cut first
/// and recursion is broken on the loop-free graph.
fn build_icfg<'a>(program: &'a dyn ProgramGraph, sets: &CriterionSets, config: &TailorConfig) -> BlockedIcfg<'a> {
    let specified = sets.specified_points();
    if config.retain_cycle {
        return BlockedIcfg::new(program, specified, &RedirectionPlan::default(), config);
    }
    let intra = RedirectionPlan::from_intra(&IntraCycles::find(program));
    let loop_free = BlockedIcfg::new(program, specified.clone(), &intra, config);
    // recursion is found on the loop-free graph, not on the raw program
    let plan = intra.clone().with_recursion_blocks(&loop_free);
    tracing::debug!(
        back_edges = plan.intra.len(),
        blocked_calls = plan.inter.len(),
        "cycles removed"
    );
    BlockedIcfg::new(program, specified, &plan, config)
}
