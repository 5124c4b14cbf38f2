/*
 * Blocked ICFG
 *
 * Forward interprocedural CFG over a `ProgramGraph` that:
 * - never enters callees of specified (non-tail criterion) points
 * - hides reflective invocation methods when a specified point performs a
 *   class lookup
 * - applies a redirection plan (cut back edges, blocked recursive calls)
 * - restores calls to static initializers that the call graph only reaches
 *   from non-call statements
 * - drops methods of blocked packages, and library methods on request
 *
 * Intraprocedural queries (succs/preds) see the redirection; start and end
 * points stay those of the original body.
 */

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::TailorConfig;
use crate::features::cycle_analysis::{BlockedCalls, CallGraphSource, RedirectionPlan};
use crate::shared::models::{MethodId, PointId};
use crate::shared::ports::ProgramGraph;

pub struct BlockedIcfg<'a> {
    program: &'a dyn ProgramGraph,
    specified: FxHashSet<PointId>,
    exclude_library: bool,

    /// Reflective invocation methods made opaque
    reflective: FxHashSet<MethodId>,
    /// Methods of blocked packages
    always_blocked: FxHashSet<MethodId>,

    replaced_succs: FxHashMap<PointId, Vec<PointId>>,
    replaced_preds: FxHashMap<PointId, Vec<PointId>>,
    blocked_callees: BlockedCalls,
    blocked_callers: FxHashMap<MethodId, FxHashSet<PointId>>,

    clinit_callees: FxHashMap<PointId, Vec<MethodId>>,
    clinit_callers: FxHashMap<MethodId, Vec<PointId>>,
}

impl<'a> BlockedIcfg<'a> {
    pub fn new(
        program: &'a dyn ProgramGraph,
        specified: FxHashSet<PointId>,
        plan: &RedirectionPlan,
        config: &TailorConfig,
    ) -> Self {
        let mut icfg = Self {
            program,
            specified: FxHashSet::default(),
            exclude_library: config.exclude_library,
            reflective: FxHashSet::default(),
            always_blocked: FxHashSet::default(),
            replaced_succs: FxHashMap::default(),
            replaced_preds: FxHashMap::default(),
            blocked_callees: BlockedCalls::default(),
            blocked_callers: FxHashMap::default(),
            clinit_callees: FxHashMap::default(),
            clinit_callers: FxHashMap::default(),
        };
        icfg.add_intra_cycles(&plan.intra);
        icfg.add_inter_cycles(&plan.inter);

        let mut sorted_specified: Vec<PointId> = specified.iter().copied().collect();
        sorted_specified.sort();
        icfg.specified = specified;

        let lookup_used = sorted_specified.iter().any(|&p| icfg.calls_class_lookup(p, config));
        if lookup_used {
            icfg.reflective = icfg.reflective_methods(config);
            tracing::debug!(
                methods = icfg.reflective.len(),
                "class lookup at a specified point, reflective invocation is opaque"
            );
        }

        for p in sorted_specified {
            let class = program.method(program.method_of(p)).class;
            if let Some(clinit) = program.method_by_name(class, &config.static_initializer_name) {
                icfg.add_call_to_clinit(clinit);
            }
        }

        for prefix in &config.block_package_prefixes {
            icfg.block_package_prefix(prefix);
        }
        icfg
    }

    fn add_intra_cycles(&mut self, intra: &FxHashMap<(PointId, PointId), FxHashSet<PointId>>) {
        let mut edges: Vec<(&(PointId, PointId), &FxHashSet<PointId>)> = intra.iter().collect();
        edges.sort_by_key(|(edge, _)| **edge);
        for (&(n, d), exits) in edges {
            let mut exits: Vec<PointId> = exits.iter().copied().collect();
            exits.sort();

            let program = self.program;
            let succs = self
                .replaced_succs
                .entry(n)
                .or_insert_with(|| program.succs_of(n).to_vec());
            succs.retain(|&s| s != d);
            for &e in &exits {
                if !succs.contains(&e) {
                    succs.push(e);
                }
            }

            self.replaced_preds
                .entry(d)
                .or_insert_with(|| program.preds_of(d).to_vec())
                .retain(|&p| p != n);
            for e in exits {
                let preds = self
                    .replaced_preds
                    .entry(e)
                    .or_insert_with(|| program.preds_of(e).to_vec());
                if !preds.contains(&n) {
                    preds.push(n);
                }
            }
        }
    }

    /// Stop entering `callees` from the given call sites
    pub fn add_inter_cycles(&mut self, inter: &BlockedCalls) {
        for (&call, callees) in inter {
            self.blocked_callees
                .entry(call)
                .or_default()
                .extend(callees.iter().copied());
            for &callee in callees {
                self.blocked_callers.entry(callee).or_default().insert(call);
            }
        }
    }

    fn calls_class_lookup(&self, p: PointId, config: &TailorConfig) -> bool {
        let Some(site) = self.program.point(p).kind.call_site() else {
            return false;
        };
        let target = self.program.method(site.target);
        let class = &self.program.class(target.class).name;
        config
            .reflection
            .class_lookup
            .iter()
            .any(|pattern| pattern.matches(class, &target.name))
    }

    fn reflective_methods(&self, config: &TailorConfig) -> FxHashSet<MethodId> {
        let patterns = config.reflection.reflective_methods();
        self.program
            .methods()
            .iter()
            .filter(|m| {
                let class = &self.program.class(m.class).name;
                patterns.iter().any(|pattern| pattern.matches(class, &m.name))
            })
            .map(|m| m.id)
            .collect()
    }

    fn block_package_prefix(&mut self, prefix: &str) {
        for class in self.program.classes() {
            if class.package().starts_with(prefix) {
                self.always_blocked
                    .extend(self.program.methods_of_class(class.id).iter().copied());
            }
        }
    }

    /// A static initializer whose call-graph callers are all non-call
    /// statements gets a synthetic caller: the first call statement found
    /// walking forward from one of them.
    fn add_call_to_clinit(&mut self, clinit: MethodId) {
        let callers = self.callers_of(clinit);
        if callers.iter().any(|&c| self.is_call_stmt(c)) {
            return;
        }
        for caller in callers {
            let mut stack = vec![caller];
            let mut visited = FxHashSet::default();
            while let Some(u) = stack.pop() {
                if !visited.insert(u) {
                    continue;
                }
                if self.is_call_stmt(u) {
                    push_unique(self.clinit_callees.entry(u).or_default(), clinit);
                    push_unique(self.clinit_callers.entry(clinit).or_default(), u);
                    return;
                }
                for &s in self.succs_of(u) {
                    if !visited.contains(&s) {
                        stack.push(s);
                    }
                }
            }
        }
        tracing::warn!(
            clinit = %clinit,
            "no call statement found to attach the static initializer to"
        );
    }

    // ------------------------------------------------------------------
    // Queries (forward orientation)
    // ------------------------------------------------------------------

    pub fn program(&self) -> &'a dyn ProgramGraph {
        self.program
    }

    pub fn entry_method(&self) -> MethodId {
        self.program.entry_method()
    }

    pub fn method_of(&self, p: PointId) -> MethodId {
        self.program.method_of(p)
    }

    pub fn is_specified(&self, p: PointId) -> bool {
        self.specified.contains(&p)
    }

    pub fn succs_of(&self, p: PointId) -> &[PointId] {
        match self.replaced_succs.get(&p) {
            Some(succs) => succs,
            None => self.program.succs_of(p),
        }
    }

    pub fn preds_of(&self, p: PointId) -> &[PointId] {
        match self.replaced_preds.get(&p) {
            Some(preds) => preds,
            None => self.program.preds_of(p),
        }
    }

    pub fn start_points_of(&self, m: MethodId) -> &[PointId] {
        self.program.start_points_of(m)
    }

    pub fn end_points_of(&self, m: MethodId) -> &[PointId] {
        self.program.end_points_of(m)
    }

    pub fn is_start_point(&self, p: PointId) -> bool {
        self.start_points_of(self.method_of(p)).contains(&p)
    }

    pub fn is_exit_stmt(&self, p: PointId) -> bool {
        self.end_points_of(self.method_of(p)).contains(&p)
    }

    pub fn is_call_stmt(&self, p: PointId) -> bool {
        self.program.is_call_stmt(p)
    }

    /// Some predecessor is a call statement
    pub fn is_return_site(&self, p: PointId) -> bool {
        self.preds_of(p).iter().any(|&q| self.is_call_stmt(q))
    }

    pub fn calls_from_within(&self, m: MethodId) -> Vec<PointId> {
        self.program
            .method(m)
            .body
            .iter()
            .copied()
            .filter(|&p| self.is_call_stmt(p))
            .collect()
    }

    pub fn callees_of_call_at(&self, p: PointId) -> Vec<MethodId> {
        if self.specified.contains(&p) {
            return Vec::new();
        }
        let blocked = self.blocked_callees.get(&p);
        let mut callees: Vec<MethodId> = self
            .program
            .callees_of_call_at(p)
            .iter()
            .copied()
            .filter(|&m| self.program.method(m).has_body())
            .filter(|m| !self.reflective.contains(m) && !self.always_blocked.contains(m))
            .filter(|m| !blocked.is_some_and(|b| b.contains(m)))
            .collect();
        if let Some(extra) = self.clinit_callees.get(&p) {
            for &m in extra {
                push_unique(&mut callees, m);
            }
        }
        if self.exclude_library {
            callees.retain(|&m| !self.program.is_library_method(m));
        }
        callees
    }

    pub fn callers_of(&self, m: MethodId) -> Vec<PointId> {
        if (self.exclude_library && self.program.is_library_method(m))
            || self.reflective.contains(&m)
            || self.always_blocked.contains(&m)
        {
            return Vec::new();
        }
        let blocked = self.blocked_callers.get(&m);
        let mut callers: Vec<PointId> = self
            .program
            .callers_of(m)
            .iter()
            .copied()
            .filter(|c| !blocked.is_some_and(|b| b.contains(c)))
            .collect();
        if let Some(extra) = self.clinit_callers.get(&m) {
            for &c in extra {
                push_unique(&mut callers, c);
            }
        }
        callers
    }

    /// Methods with a body, in program order
    pub fn methods_with_bodies(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.program
            .methods()
            .iter()
            .filter(|m| m.has_body())
            .map(|m| m.id)
    }
}

impl CallGraphSource for BlockedIcfg<'_> {
    fn entry_method(&self) -> MethodId {
        BlockedIcfg::entry_method(self)
    }

    fn method_of(&self, p: PointId) -> MethodId {
        BlockedIcfg::method_of(self, p)
    }

    fn calls_from_within(&self, m: MethodId) -> Vec<PointId> {
        BlockedIcfg::calls_from_within(self, m)
    }

    fn callees_of_call_at(&self, p: PointId) -> Vec<MethodId> {
        BlockedIcfg::callees_of_call_at(self, p)
    }

    fn callers_of(&self, m: MethodId) -> Vec<PointId> {
        BlockedIcfg::callers_of(self, m)
    }
}

fn push_unique<T: PartialEq>(v: &mut Vec<T>, item: T) {
    if !v.contains(&item) {
        v.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::cycle_analysis::IntraCycles;
    use crate::shared::models::{Program, ProgramBuilder};

    fn specified(points: &[PointId]) -> FxHashSet<PointId> {
        points.iter().copied().collect()
    }

    #[test]
    fn test_specified_points_are_opaque() {
        let mut b = ProgramBuilder::new();
        let cls = b.class("app.Main");
        let main = b.static_method(cls, "main");
        let helper = b.static_method(cls, "helper");
        let c1 = b.static_call(main, 1, helper);
        let c2 = b.static_call(main, 2, helper);
        b.chain(&[c1, c2]);
        b.plain(helper, 10);
        b.call_edge(c1, helper).call_edge(c2, helper);
        b.entry(main);
        let program = b.build().unwrap();

        let icfg = BlockedIcfg::new(
            &program,
            specified(&[c1]),
            &RedirectionPlan::default(),
            &TailorConfig::default(),
        );
        assert!(icfg.callees_of_call_at(c1).is_empty());
        assert_eq!(icfg.callees_of_call_at(c2), vec![helper]);
        // callers are not affected by opacity
        assert_eq!(icfg.callers_of(helper), vec![c1, c2]);
    }

    #[test]
    fn test_bodiless_callees_filtered() {
        let mut b = ProgramBuilder::new();
        let cls = b.class("app.Main");
        let main = b.static_method(cls, "main");
        let native = b.static_method(cls, "nativeCall");
        let c = b.static_call(main, 1, native);
        b.call_edge(c, native);
        b.entry(main);
        let program = b.build().unwrap();

        let icfg = BlockedIcfg::new(
            &program,
            FxHashSet::default(),
            &RedirectionPlan::default(),
            &TailorConfig::default(),
        );
        assert!(icfg.callees_of_call_at(c).is_empty());
    }

    fn reflective_program() -> (Program, PointId, PointId, MethodId) {
        let mut b = ProgramBuilder::new();
        let main_cls = b.class("app.Main");
        let class_cls = b.library_class("java.lang.Class");
        let method_cls = b.library_class("java.lang.reflect.Method");
        let main = b.static_method(main_cls, "main");
        let for_name = b.static_method(class_cls, "forName");
        let invoke = b.instance_method(method_cls, "invoke");
        b.plain(for_name, 100);
        b.plain(invoke, 200);
        let lookup = b.static_call(main, 1, for_name);
        let call = b.virtual_call(main, 2, "m", invoke);
        let end = b.plain(main, 3);
        b.chain(&[lookup, call, end]);
        b.call_edge(lookup, for_name).call_edge(call, invoke);
        b.entry(main);
        (b.build().unwrap(), lookup, call, invoke)
    }

    #[test]
    fn test_reflection_heuristic() {
        let (program, lookup, call, invoke) = reflective_program();

        let plain = BlockedIcfg::new(
            &program,
            FxHashSet::default(),
            &RedirectionPlan::default(),
            &TailorConfig::default(),
        );
        assert_eq!(plain.callees_of_call_at(call), vec![invoke]);

        let icfg = BlockedIcfg::new(
            &program,
            specified(&[lookup]),
            &RedirectionPlan::default(),
            &TailorConfig::default(),
        );
        assert!(icfg.callees_of_call_at(call).is_empty());
        assert!(icfg.callers_of(invoke).is_empty());
    }

    #[test]
    fn test_exclude_library_and_blocked_packages() {
        let (program, _, call, invoke) = reflective_program();
        let config = TailorConfig::default().exclude_library(true);
        let icfg = BlockedIcfg::new(&program, FxHashSet::default(), &RedirectionPlan::default(), &config);
        assert!(icfg.callees_of_call_at(call).is_empty());
        assert!(icfg.callers_of(invoke).is_empty());

        let config = TailorConfig::default().block_package_prefix("java.lang");
        let icfg = BlockedIcfg::new(&program, FxHashSet::default(), &RedirectionPlan::default(), &config);
        assert!(icfg.callees_of_call_at(call).is_empty());
    }

    #[test]
    fn test_back_edge_redirection() {
        // 0 → 1 → 2 → 1, 1 → 3
        let mut b = ProgramBuilder::new();
        let cls = b.class("app.Main");
        let main = b.static_method(cls, "main");
        let p: Vec<PointId> = (0..4).map(|i| b.plain(main, i)).collect();
        b.chain(&[p[0], p[1], p[2], p[1]]);
        b.edge(p[1], p[3]);
        b.entry(main);
        let program = b.build().unwrap();

        let plan = RedirectionPlan::from_intra(&IntraCycles::find(&program));
        let icfg = BlockedIcfg::new(&program, FxHashSet::default(), &plan, &TailorConfig::default());
        assert_eq!(icfg.succs_of(p[2]), &[p[3]]);
        assert_eq!(icfg.preds_of(p[1]), &[p[0]]);
        assert!(icfg.preds_of(p[3]).contains(&p[2]));
        // end points are those of the original body
        assert!(!icfg.is_exit_stmt(p[2]));
        assert!(icfg.is_exit_stmt(p[3]));
    }

    #[test]
    fn test_static_initializer_restored() {
        // main: 0(new Api) → 1(call api) ; clinit reached from point 0 only
        let mut b = ProgramBuilder::new();
        let main_cls = b.class("app.Main");
        let api_cls = b.class("app.Api");
        let main = b.static_method(main_cls, "main");
        let api = b.static_method(api_cls, "run");
        let clinit = b.static_method(main_cls, "<clinit>");
        b.plain(clinit, 50);
        b.plain(api, 60);
        let alloc = b.new_object(main, 1, "a", api_cls);
        let call = b.static_call(main, 2, api);
        let crit = b.static_call(main, 3, api);
        b.chain(&[alloc, call, crit]);
        b.call_edge(alloc, clinit).call_edge(call, api).call_edge(crit, api);
        b.entry(main);
        let program = b.build().unwrap();

        let icfg = BlockedIcfg::new(
            &program,
            specified(&[crit]),
            &RedirectionPlan::default(),
            &TailorConfig::default(),
        );
        assert_eq!(icfg.callees_of_call_at(call), vec![api, clinit]);
        assert!(icfg.callers_of(clinit).contains(&call));
    }
}
