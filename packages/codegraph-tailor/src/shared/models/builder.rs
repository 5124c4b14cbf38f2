//! Fluent construction of `ProgramData`
//!
//! Used by tests, benches and small front ends. Points are appended to the
//! owning method's body in creation order; edges are explicit.
//!
//! ```rust,ignore
//! let mut b = ProgramBuilder::new();
//! let cls = b.class("app.Main");
//! let main = b.static_method(cls, "main");
//! let a = b.static_call(main, 3, api);
//! let exit = b.plain(main, 4);
//! b.chain(&[a, exit]);
//! b.entry(main);
//! let program = b.build()?;
//! ```

use super::ids::{AllocSiteId, ClassId, MethodId, PointId};
use super::program::{
    AllocSite, CallEdge, CallSite, Class, IntraEdge, InvokeKind, Method, Point, PointKind,
    PointsToEntry, Program, ProgramData, CONSTRUCTOR_NAME,
};
use crate::errors::Result;

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    data: ProgramData,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    fn add_class(&mut self, name: &str, is_interface: bool, is_library: bool) -> ClassId {
        let id = ClassId::from_index(self.data.classes.len());
        self.data.classes.push(Class {
            id,
            name: name.to_string(),
            super_class: None,
            interfaces: Vec::new(),
            is_interface,
            is_library,
        });
        id
    }

    pub fn class(&mut self, name: &str) -> ClassId {
        self.add_class(name, false, false)
    }

    pub fn interface(&mut self, name: &str) -> ClassId {
        self.add_class(name, true, false)
    }

    pub fn library_class(&mut self, name: &str) -> ClassId {
        self.add_class(name, false, true)
    }

    pub fn extends(&mut self, sub: ClassId, sup: ClassId) -> &mut Self {
        self.data.classes[sub.index()].super_class = Some(sup);
        self
    }

    pub fn implements(&mut self, class: ClassId, iface: ClassId) -> &mut Self {
        self.data.classes[class.index()].interfaces.push(iface);
        self
    }

    // ------------------------------------------------------------------
    // Methods
    // ------------------------------------------------------------------

    fn add_method(&mut self, class: ClassId, name: &str, is_static: bool, is_abstract: bool) -> MethodId {
        let id = MethodId::from_index(self.data.methods.len());
        self.data.methods.push(Method {
            id,
            class,
            name: name.to_string(),
            signature: "()".to_string(),
            is_static,
            is_abstract,
            body: Vec::new(),
        });
        id
    }

    pub fn static_method(&mut self, class: ClassId, name: &str) -> MethodId {
        self.add_method(class, name, true, false)
    }

    pub fn instance_method(&mut self, class: ClassId, name: &str) -> MethodId {
        self.add_method(class, name, false, false)
    }

    pub fn abstract_method(&mut self, class: ClassId, name: &str) -> MethodId {
        self.add_method(class, name, false, true)
    }

    pub fn constructor(&mut self, class: ClassId) -> MethodId {
        self.add_method(class, CONSTRUCTOR_NAME, false, false)
    }

    pub fn signature(&mut self, method: MethodId, signature: &str) -> &mut Self {
        self.data.methods[method.index()].signature = signature.to_string();
        self
    }

    pub fn entry(&mut self, method: MethodId) -> &mut Self {
        self.data.entry = Some(method);
        self
    }

    // ------------------------------------------------------------------
    // Points
    // ------------------------------------------------------------------

    pub fn point(&mut self, method: MethodId, line: i32, kind: PointKind) -> PointId {
        let id = PointId::from_index(self.data.points.len());
        let text = self.describe(&kind);
        self.data.points.push(Point {
            id,
            method,
            line,
            kind,
            text,
        });
        self.data.methods[method.index()].body.push(id);
        id
    }

    pub fn plain(&mut self, method: MethodId, line: i32) -> PointId {
        self.point(method, line, PointKind::Plain)
    }

    pub fn nop(&mut self, method: MethodId, line: i32) -> PointId {
        self.point(method, line, PointKind::Nop)
    }

    pub fn catch_entry(&mut self, method: MethodId, line: i32) -> PointId {
        self.point(method, line, PointKind::CatchEntry)
    }

    pub fn new_object(&mut self, method: MethodId, line: i32, local: &str, class: ClassId) -> PointId {
        self.point(
            method,
            line,
            PointKind::New {
                local: local.to_string(),
                class,
            },
        )
    }

    pub fn call(&mut self, method: MethodId, line: i32, site: CallSite) -> PointId {
        self.point(method, line, PointKind::Call(site))
    }

    pub fn static_call(&mut self, method: MethodId, line: i32, target: MethodId) -> PointId {
        self.call(
            method,
            line,
            CallSite {
                target,
                invoke: InvokeKind::Static,
                receiver: None,
                args: Vec::new(),
                assigned: None,
            },
        )
    }

    pub fn instance_call(
        &mut self,
        method: MethodId,
        line: i32,
        invoke: InvokeKind,
        receiver: &str,
        target: MethodId,
    ) -> PointId {
        self.call(
            method,
            line,
            CallSite {
                target,
                invoke,
                receiver: Some(receiver.to_string()),
                args: Vec::new(),
                assigned: None,
            },
        )
    }

    pub fn virtual_call(&mut self, method: MethodId, line: i32, receiver: &str, target: MethodId) -> PointId {
        self.instance_call(method, line, InvokeKind::Virtual, receiver, target)
    }

    pub fn special_call(&mut self, method: MethodId, line: i32, receiver: &str, target: MethodId) -> PointId {
        self.instance_call(method, line, InvokeKind::Special, receiver, target)
    }

    /// Set call arguments (e.g. the receiver object of `Method.invoke`).
    pub fn args(&mut self, call: PointId, args: &[&str]) -> &mut Self {
        if let PointKind::Call(site) = &mut self.data.points[call.index()].kind {
            site.args = args.iter().map(|a| a.to_string()).collect();
        }
        self
    }

    /// Set the local receiving a call result.
    pub fn assign(&mut self, call: PointId, local: &str) -> &mut Self {
        if let PointKind::Call(site) = &mut self.data.points[call.index()].kind {
            site.assigned = Some(local.to_string());
        }
        self
    }

    fn describe(&self, kind: &PointKind) -> String {
        match kind {
            PointKind::Plain => "stmt".to_string(),
            PointKind::Nop => "nop".to_string(),
            PointKind::CatchEntry => "@caughtexception".to_string(),
            PointKind::New { local, class } => {
                format!("{} = new {}", local, self.data.classes[class.index()].name)
            }
            PointKind::Call(site) => {
                let target = &self.data.methods[site.target.index()];
                let class = &self.data.classes[target.class.index()].name;
                match &site.receiver {
                    Some(r) => format!("{}.<{}: {}>()", r, class, target.name),
                    None => format!("<{}: {}>()", class, target.name),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    pub fn edge(&mut self, from: PointId, to: PointId) -> &mut Self {
        self.data.edges.push(IntraEdge {
            from,
            to,
            exceptional: false,
        });
        self
    }

    pub fn exceptional_edge(&mut self, from: PointId, to: PointId) -> &mut Self {
        self.data.edges.push(IntraEdge {
            from,
            to,
            exceptional: true,
        });
        self
    }

    /// Straight-line normal edges through `points`.
    pub fn chain(&mut self, points: &[PointId]) -> &mut Self {
        for pair in points.windows(2) {
            self.edge(pair[0], pair[1]);
        }
        self
    }

    pub fn call_edge(&mut self, site: PointId, callee: MethodId) -> &mut Self {
        self.data.calls.push(CallEdge { site, callee });
        self
    }

    // ------------------------------------------------------------------
    // Points-to
    // ------------------------------------------------------------------

    pub fn alloc_site(&mut self, point: PointId, class: ClassId) -> AllocSiteId {
        let id = AllocSiteId::from_index(self.data.alloc_sites.len());
        self.data.alloc_sites.push(AllocSite { id, point, class });
        id
    }

    pub fn points_to(&mut self, method: MethodId, local: &str, sites: &[AllocSiteId]) -> &mut Self {
        self.data.points_to.push(PointsToEntry {
            method,
            local: local.to_string(),
            sites: sites.to_vec(),
        });
        self
    }

    pub fn into_data(self) -> ProgramData {
        self.data
    }

    pub fn build(self) -> Result<Program> {
        Program::from_data(self.data)
    }
}
