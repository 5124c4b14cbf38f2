/*
 * Extension Finder
 *
 * Builds the extension relation for the heads of the current criteria:
 *   point → call sites that may lead execution into the point's method
 *
 * Discovery is a BFS from the criterion heads; every discovered point is
 * expanded in turn. Afterwards every point that cannot change the shape of
 * a match (not in a branch, not below a polymorphic call, in a loop or
 * recursion, unreachable) is removed and its predecessors and successors
 * are linked directly.
 */

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::time::Instant;

use super::alloc::{receiver_local, AllocResolver};
use crate::config::TailorConfig;
use crate::errors::Result;
use crate::features::cycle_analysis::{build_call_graph, BlockedCalls};
use crate::features::fact_model::{CriterionSets, ExtensionMap};
use crate::features::icfg::BlockedIcfg;
use crate::features::tagging::{Tag, TagTable};
use crate::shared::models::{MethodId, PointId};
use crate::shared::ports::PointsToProvider;

pub struct ExtensionFinder<'f, 'a> {
    icfg: &'f BlockedIcfg<'a>,
    sets: &'f CriterionSets,
    tags: &'f TagTable,
    config: &'f TailorConfig,
    resolver: AllocResolver<'f>,

    /// Methods reachable from the entry method
    reachable: FxHashSet<MethodId>,

    preds: ExtensionMap,
    succs: ExtensionMap,
    /// Method → entered through a branch or a polymorphic call
    interesting: FxHashMap<MethodId, bool>,
}

impl<'f, 'a> ExtensionFinder<'f, 'a> {
    pub fn new(
        icfg: &'f BlockedIcfg<'a>,
        pts: &'f dyn PointsToProvider,
        sets: &'f CriterionSets,
        tags: &'f TagTable,
        config: &'f TailorConfig,
    ) -> Self {
        let reachable = build_call_graph(icfg, &BlockedCalls::default())
            .nodes()
            .collect();
        Self {
            icfg,
            sets,
            tags,
            config,
            resolver: AllocResolver::new(icfg.program(), pts, tags, &config.reflection),
            reachable,
            preds: ExtensionMap::default(),
            succs: ExtensionMap::default(),
            interesting: FxHashMap::default(),
        }
    }

    /// Compute the pruned extension relation for the criterion heads.
    pub fn find(mut self) -> Result<ExtensionMap> {
        let start = Instant::now();
        let mut heads: Vec<PointId> = self.sets.criteria().iter().filter_map(|c| c.head()).collect();
        heads.sort();
        heads.dedup();

        self.build(heads)?;
        let discovered = self.preds.len();
        self.remove_useless_points();

        tracing::info!(
            discovered,
            kept = self.preds.len(),
            edges = self.preds.values().map(|s| s.len()).sum::<usize>(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "extension relation built"
        );
        Ok(self.preds)
    }

    fn build(&mut self, heads: Vec<PointId>) -> Result<()> {
        let mut queue: VecDeque<PointId> = heads.into();
        while let Some(p) = queue.pop_front() {
            if self.preds.contains_key(&p) {
                continue;
            }
            let exts = self.extension_points(p)?;
            for &ext in &exts {
                if !self.preds.contains_key(&ext) {
                    queue.push_back(ext);
                }
                self.succs.entry(ext).or_default().insert(p);
                tracing::debug!(point = %p, extension = %ext, "extension edge");
            }
            self.preds.insert(p, exts.into_iter().collect());
        }
        Ok(())
    }

    /// Call sites that can lead into the method containing `p`
    fn extension_points(&self, p: PointId) -> Result<Vec<PointId>> {
        let program = self.icfg.program();
        let method = self.icfg.method_of(p);
        let mut exts: Vec<PointId> = Vec::new();

        if program.method(method).is_static {
            exts.extend(
                self.icfg
                    .callers_of(method)
                    .into_iter()
                    .filter(|&c| self.icfg.is_call_stmt(c)),
            );
        } else {
            for caller in self.icfg.callers_of(method) {
                let Some(site) = program.point(caller).kind.call_site() else {
                    continue;
                };
                if !site.invoke.is_instance() {
                    // an instance method entered from a static call site
                    exts.push(caller);
                    continue;
                }
                let Some(local) = receiver_local(program, site, &self.config.reflection) else {
                    tracing::debug!(caller = %caller, "reflective call without receiver local");
                    continue;
                };
                for call in self.resolver.creation_calls(caller, site, method, local)? {
                    if !exts.contains(&call) {
                        exts.push(call);
                    }
                }
            }
        }

        exts.retain(|&e| e != p);
        if self.config.exclude_library_extension
            && exts
                .iter()
                .any(|&e| program.is_library_method(self.icfg.method_of(e)))
        {
            exts.clear();
        }
        Ok(exts)
    }

    fn remove_useless_points(&mut self) {
        let mut points: Vec<PointId> = self.preds.keys().copied().collect();
        points.sort();
        for p in points {
            if self.is_useless(p) {
                self.remove_point(p);
            }
        }
    }

    /// Drop `p`, linking its predecessors to its successors
    fn remove_point(&mut self, p: PointId) {
        tracing::debug!(point = %p, "pruning extension point");
        let preds_of_p = self.preds.remove(&p).unwrap_or_default();
        let succs_of_p = self.succs.remove(&p).unwrap_or_default();

        for &succ in &succs_of_p {
            if let Some(preds) = self.preds.get_mut(&succ) {
                preds.remove(&p);
                preds.extend(preds_of_p.iter().copied().filter(|&q| q != succ));
            }
        }
        for &pred in &preds_of_p {
            if let Some(succs) = self.succs.get_mut(&pred) {
                succs.remove(&p);
                succs.extend(succs_of_p.iter().copied().filter(|&s| s != pred));
            }
        }
    }

    fn is_useless(&mut self, p: PointId) -> bool {
        let method = self.icfg.method_of(p);
        if self.sets.is_criterion_point(p) || method == self.icfg.entry_method() {
            return false;
        }
        if self.tags.point_has(p, Tag::IntraCycle)
            || self.tags.method_has(method, Tag::IntraCycle)
            || self.tags.method_has(method, Tag::InterCycle)
        {
            return true;
        }
        if self.is_class_literal_call(p) || !self.reachable.contains(&method) {
            return true;
        }
        !self.is_point_interesting(p)
    }

    fn is_class_literal_call(&self, p: PointId) -> bool {
        let program = self.icfg.program();
        program
            .point(p)
            .kind
            .call_site()
            .is_some_and(|site| program.method(site.target).name == self.config.class_literal_method)
    }

    fn is_point_interesting(&mut self, p: PointId) -> bool {
        self.tags.point_has(p, Tag::Branch) || self.is_method_interesting(self.icfg.method_of(p))
    }

    /// Entered through a polymorphic call, or through a caller that is
    /// itself interesting. Recursive methods carry InterCycle and are
    /// never asked, so the ascent follows an acyclic caller chain.
    fn is_method_interesting(&mut self, m: MethodId) -> bool {
        if let Some(&known) = self.interesting.get(&m) {
            return known;
        }
        if self.tags.method_has(m, Tag::InterCycle) {
            self.interesting.insert(m, false);
            return false;
        }
        // provisional answer while the ascent is in progress
        self.interesting.insert(m, false);

        let callers = self.icfg.callers_of(m);
        let result = self.is_entered_polymorphically(&callers)
            || callers
                .iter()
                .any(|&c| self.icfg.is_call_stmt(c) && self.is_point_interesting(c));
        self.interesting.insert(m, result);
        result
    }

    fn is_entered_polymorphically(&self, callers: &[PointId]) -> bool {
        let program = self.icfg.program();
        callers.iter().any(|&c| {
            let dispatching = program
                .point(c)
                .kind
                .call_site()
                .is_some_and(|site| site.invoke.is_dispatching());
            dispatching
                && self
                    .icfg
                    .callees_of_call_at(c)
                    .iter()
                    .filter(|&&m| !self.config.is_static_initializer(&program.method(m).name))
                    .count()
                    > 1
        })
    }
}
