//! In-memory whole-program model
//!
//! `ProgramData` is the serialized form (JSON) produced by a front end:
//! classes, methods with ordered bodies, intraprocedural edges, the call
//! graph and a points-to summary. `Program` indexes it once and answers the
//! `ProgramGraph` / `PointsToProvider` port queries from dense tables.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ids::{AllocSiteId, ClassId, MethodId, PointId};
use crate::errors::{Result, TailorError};
use crate::shared::ports::{PointsToProvider, ProgramGraph};

/// Name of instance constructors
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    Static,
    /// Private, super and constructor calls (no virtual dispatch)
    Special,
    Virtual,
    Interface,
}

impl InvokeKind {
    pub fn is_instance(self) -> bool {
        !matches!(self, InvokeKind::Static)
    }

    pub fn is_dispatching(self) -> bool {
        matches!(self, InvokeKind::Virtual | InvokeKind::Interface)
    }
}

/// Invoke expression of a call statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Statically referenced method
    pub target: MethodId,
    pub invoke: InvokeKind,
    /// Receiver local for instance invokes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Left-hand side when the call result is assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointKind {
    Plain,
    Call(CallSite),
    /// `local = new class`
    New { local: String, class: ClassId },
    /// Exception handler entry (`r = @caughtexception`)
    CatchEntry,
    Nop,
}

impl PointKind {
    pub fn is_call(&self) -> bool {
        matches!(self, PointKind::Call(_))
    }

    pub fn call_site(&self) -> Option<&CallSite> {
        match self {
            PointKind::Call(site) => Some(site),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub method: MethodId,
    /// Source line, -1 when unknown
    #[serde(default = "unknown_line")]
    pub line: i32,
    #[serde(flatten)]
    pub kind: PointKind,
    /// Printable statement text
    #[serde(default)]
    pub text: String,
}

fn unknown_line() -> i32 {
    -1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub id: MethodId,
    pub class: ClassId,
    pub name: String,
    /// Parameter/return descriptor used to match overrides
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
    /// Ordered body; empty for abstract, native and phantom methods
    #[serde(default)]
    pub body: Vec<PointId>,
}

impl Method {
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    /// Fully qualified name
    pub name: String,
    #[serde(default)]
    pub super_class: Option<ClassId>,
    #[serde(default)]
    pub interfaces: Vec<ClassId>,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default)]
    pub is_library: bool,
}

impl Class {
    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }

    /// Name without the package
    pub fn short_name(&self) -> &str {
        self.name.rsplit_once('.').map(|(_, short)| short).unwrap_or(&self.name)
    }

    pub fn is_application(&self) -> bool {
        !self.is_library
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntraEdge {
    pub from: PointId,
    pub to: PointId,
    #[serde(default)]
    pub exceptional: bool,
}

/// Call-graph edge; `site` may be a non-call statement for implicit
/// static-initializer triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub site: PointId,
    pub callee: MethodId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocSite {
    pub id: AllocSiteId,
    /// The `new` statement, or the reflective `newInstance` call
    pub point: PointId,
    pub class: ClassId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsToEntry {
    pub method: MethodId,
    pub local: String,
    pub sites: Vec<AllocSiteId>,
}

/// Serialized program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramData {
    pub entry: Option<MethodId>,
    pub classes: Vec<Class>,
    pub methods: Vec<Method>,
    pub points: Vec<Point>,
    #[serde(default)]
    pub edges: Vec<IntraEdge>,
    #[serde(default)]
    pub calls: Vec<CallEdge>,
    #[serde(default)]
    pub alloc_sites: Vec<AllocSite>,
    #[serde(default)]
    pub points_to: Vec<PointsToEntry>,
}

/// Indexed program
#[derive(Debug)]
pub struct Program {
    entry: MethodId,
    classes: Vec<Class>,
    methods: Vec<Method>,
    points: Vec<Point>,
    alloc_sites: Vec<AllocSite>,

    succs: Vec<Vec<PointId>>,
    preds: Vec<Vec<PointId>>,
    normal_succs: Vec<Vec<PointId>>,
    normal_preds: Vec<Vec<PointId>>,
    heads: Vec<Vec<PointId>>,
    tails: Vec<Vec<PointId>>,

    callees: Vec<Vec<MethodId>>,
    callers: Vec<Vec<PointId>>,
    class_methods: Vec<Vec<MethodId>>,
    class_by_name: FxHashMap<String, ClassId>,
    points_to: FxHashMap<(MethodId, String), Vec<AllocSiteId>>,
}

fn push_unique<T: PartialEq>(v: &mut Vec<T>, item: T) {
    if !v.contains(&item) {
        v.push(item);
    }
}

impl Program {
    pub fn from_data(data: ProgramData) -> Result<Self> {
        let ProgramData {
            entry,
            classes,
            methods,
            points,
            edges,
            calls,
            alloc_sites,
            points_to,
        } = data;

        let entry = entry.ok_or_else(|| TailorError::program("no entry method"))?;
        if entry.index() >= methods.len() {
            return Err(TailorError::program(format!("entry {} out of range", entry)));
        }
        for (i, c) in classes.iter().enumerate() {
            if c.id.index() != i {
                return Err(TailorError::program(format!("class {} stored at {}", c.id, i)));
            }
            let dangling = c
                .super_class
                .iter()
                .chain(c.interfaces.iter())
                .any(|s| s.index() >= classes.len());
            if dangling {
                return Err(TailorError::program(format!(
                    "class {} has an unknown supertype",
                    c.name
                )));
            }
        }
        for (i, m) in methods.iter().enumerate() {
            if m.id.index() != i || m.class.index() >= classes.len() {
                return Err(TailorError::program(format!("malformed method {}", m.id)));
            }
            for p in &m.body {
                match points.get(p.index()) {
                    Some(point) if point.method == m.id => {}
                    _ => {
                        return Err(TailorError::program(format!(
                            "body of {} lists foreign point {}",
                            m.name, p
                        )))
                    }
                }
            }
        }
        for (i, p) in points.iter().enumerate() {
            if p.id.index() != i || p.method.index() >= methods.len() {
                return Err(TailorError::program(format!("malformed point {}", p.id)));
            }
            if let PointKind::Call(site) = &p.kind {
                if site.target.index() >= methods.len() {
                    return Err(TailorError::program(format!(
                        "call at {} targets unknown method {}",
                        p.id, site.target
                    )));
                }
            }
        }
        let point_ok = |p: PointId| p.index() < points.len();

        let n = points.len();
        let mut succs = vec![Vec::new(); n];
        let mut preds = vec![Vec::new(); n];
        let mut normal_succs = vec![Vec::new(); n];
        let mut normal_preds = vec![Vec::new(); n];
        for e in &edges {
            if !point_ok(e.from) || !point_ok(e.to) {
                return Err(TailorError::program(format!(
                    "edge {} -> {} out of range",
                    e.from, e.to
                )));
            }
            if points[e.from.index()].method != points[e.to.index()].method {
                return Err(TailorError::program(format!(
                    "intraprocedural edge {} -> {} crosses methods",
                    e.from, e.to
                )));
            }
            push_unique(&mut succs[e.from.index()], e.to);
            push_unique(&mut preds[e.to.index()], e.from);
            if !e.exceptional {
                push_unique(&mut normal_succs[e.from.index()], e.to);
                push_unique(&mut normal_preds[e.to.index()], e.from);
            }
        }

        let mut heads = vec![Vec::new(); methods.len()];
        let mut tails = vec![Vec::new(); methods.len()];
        for m in &methods {
            for &p in &m.body {
                if preds[p.index()].is_empty() {
                    heads[m.id.index()].push(p);
                }
                if succs[p.index()].is_empty() {
                    tails[m.id.index()].push(p);
                }
            }
            if let Some(&first) = m.body.first() {
                if heads[m.id.index()].is_empty() {
                    heads[m.id.index()].push(first);
                }
            }
        }

        let mut callees = vec![Vec::new(); n];
        let mut callers = vec![Vec::new(); methods.len()];
        for c in &calls {
            if !point_ok(c.site) || c.callee.index() >= methods.len() {
                return Err(TailorError::program(format!(
                    "call edge {} -> {} out of range",
                    c.site, c.callee
                )));
            }
            push_unique(&mut callees[c.site.index()], c.callee);
            push_unique(&mut callers[c.callee.index()], c.site);
        }

        let mut class_methods = vec![Vec::new(); classes.len()];
        for m in &methods {
            class_methods[m.class.index()].push(m.id);
        }
        let class_by_name = classes.iter().map(|c| (c.name.clone(), c.id)).collect();

        for (i, a) in alloc_sites.iter().enumerate() {
            if a.id.index() != i || !point_ok(a.point) || a.class.index() >= classes.len() {
                return Err(TailorError::program(format!("malformed allocation site {}", a.id)));
            }
        }
        let mut pts: FxHashMap<(MethodId, String), Vec<AllocSiteId>> = FxHashMap::default();
        for entry in points_to {
            if entry.sites.iter().any(|s| s.index() >= alloc_sites.len()) {
                return Err(TailorError::program(format!(
                    "points-to set of {} in {} names an unknown site",
                    entry.local, entry.method
                )));
            }
            let slot = pts.entry((entry.method, entry.local)).or_default();
            for s in entry.sites {
                push_unique(slot, s);
            }
        }

        Ok(Self {
            entry,
            classes,
            methods,
            points,
            alloc_sites,
            succs,
            preds,
            normal_succs,
            normal_preds,
            heads,
            tails,
            callees,
            callers,
            class_methods,
            class_by_name,
            points_to: pts,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let data: ProgramData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// `Class.method` for diagnostics and reports
    pub fn qualified_name(&self, m: MethodId) -> String {
        let method = &self.methods[m.index()];
        format!("{}.{}", self.classes[method.class.index()].name, method.name)
    }
}

impl ProgramGraph for Program {
    fn entry_method(&self) -> MethodId {
        self.entry
    }

    fn methods(&self) -> &[Method] {
        &self.methods
    }

    fn classes(&self) -> &[Class] {
        &self.classes
    }

    fn point(&self, p: PointId) -> &Point {
        &self.points[p.index()]
    }

    fn succs_of(&self, p: PointId) -> &[PointId] {
        &self.succs[p.index()]
    }

    fn preds_of(&self, p: PointId) -> &[PointId] {
        &self.preds[p.index()]
    }

    fn normal_succs_of(&self, p: PointId) -> &[PointId] {
        &self.normal_succs[p.index()]
    }

    fn normal_preds_of(&self, p: PointId) -> &[PointId] {
        &self.normal_preds[p.index()]
    }

    fn start_points_of(&self, m: MethodId) -> &[PointId] {
        &self.heads[m.index()]
    }

    fn end_points_of(&self, m: MethodId) -> &[PointId] {
        &self.tails[m.index()]
    }

    fn callees_of_call_at(&self, p: PointId) -> &[MethodId] {
        &self.callees[p.index()]
    }

    fn callers_of(&self, m: MethodId) -> &[PointId] {
        &self.callers[m.index()]
    }

    fn methods_of_class(&self, c: ClassId) -> &[MethodId] {
        &self.class_methods[c.index()]
    }

    fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }
}

impl PointsToProvider for Program {
    fn reaching_alloc_sites(&self, method: MethodId, local: &str) -> &[AllocSiteId] {
        self.points_to
            .get(&(method, local.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn alloc_site(&self, id: AllocSiteId) -> &AllocSite {
        &self.alloc_sites[id.index()]
    }

    fn is_subclass_including(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut current = Some(sub);
        while let Some(c) = current {
            if c == sup {
                return true;
            }
            current = self.classes[c.index()].super_class;
        }
        false
    }

    fn is_implementer(&self, class: ClassId, iface: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(c) = current {
            let mut stack: Vec<ClassId> = self.classes[c.index()].interfaces.clone();
            let mut seen = Vec::new();
            while let Some(i) = stack.pop() {
                if i == iface {
                    return true;
                }
                if !seen.contains(&i) {
                    seen.push(i);
                    stack.extend(self.classes[i.index()].interfaces.iter().copied());
                }
            }
            current = self.classes[c.index()].super_class;
        }
        false
    }

    fn resolve_concrete_dispatch(&self, class: ClassId, declared: MethodId) -> Option<MethodId> {
        let decl = &self.methods[declared.index()];
        let mut current = Some(class);
        while let Some(c) = current {
            let found = self.class_methods[c.index()].iter().copied().find(|&m| {
                let cand = &self.methods[m.index()];
                cand.name == decl.name && cand.signature == decl.signature && !cand.is_abstract
            });
            if found.is_some() {
                return found;
            }
            current = self.classes[c.index()].super_class;
        }
        None
    }
}
