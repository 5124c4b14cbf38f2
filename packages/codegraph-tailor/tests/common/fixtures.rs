//! Program fixtures
//!
//! Every fixture names its statements so tests read like the program they
//! describe. Bodies end with a plain statement after the last call, as
//! compiled code always does.

use std::collections::HashMap;

use codegraph_tailor::features::fact_model::StatementSequence;
use codegraph_tailor::{PointId, Program, ProgramBuilder, TailorConfig, TailoringOrchestrator, TailoringResult};

pub struct Fixture {
    pub program: Program,
    points: HashMap<&'static str, PointId>,
}

impl Fixture {
    fn new(builder: ProgramBuilder, points: &[(&'static str, PointId)]) -> Self {
        Self {
            program: builder.build().expect("fixture program is well formed"),
            points: points.iter().copied().collect(),
        }
    }

    pub fn p(&self, name: &str) -> PointId {
        self.points[name]
    }

    pub fn ps(&self, names: &[&str]) -> Vec<PointId> {
        names.iter().map(|n| self.p(n)).collect()
    }

    pub fn criterion(&self, names: &[&str]) -> StatementSequence {
        StatementSequence::from_points(self.ps(names))
    }

    /// Run one criterion group to completion
    pub fn tailor(&self, config: &TailorConfig, criteria: &[StatementSequence]) -> TailoringResult {
        let tail = criteria[0].tail().expect("non-empty criterion");
        let mut orchestrator =
            TailoringOrchestrator::new(&self.program, &self.program, config, tail, criteria)
                .expect("orchestrator builds");
        orchestrator.run().expect("tailoring runs");
        orchestrator.into_result().expect("result available")
    }
}

/// ```text
/// main: x → a:open() → y → b:read() → c:close() → ret
///       x → z → ret
/// ```
pub fn straight_line() -> Fixture {
    let mut b = ProgramBuilder::new();
    let app = b.class("app.Main");
    let api = b.library_class("lib.Api");
    let main = b.static_method(app, "main");
    let open = b.static_method(api, "open");
    let read = b.static_method(api, "read");
    let close = b.static_method(api, "close");

    let x = b.plain(main, 1);
    let a = b.static_call(main, 2, open);
    let y = b.plain(main, 3);
    let bb = b.static_call(main, 4, read);
    let c = b.static_call(main, 5, close);
    let ret = b.plain(main, 6);
    let z = b.plain(main, 7);
    b.chain(&[x, a, y, bb, c, ret]).chain(&[x, z, ret]);
    b.call_edge(a, open).call_edge(bb, read).call_edge(c, close);
    b.entry(main);

    Fixture::new(
        b,
        &[("x", x), ("a", a), ("y", y), ("b", bb), ("c", c), ("ret", ret), ("z", z)],
    )
}

/// ```text
/// main: a:open() → h ⇄ {b:read(), x} ; h → c:close() → ret
/// ```
/// `b` and `x` are the two arms of a loop headed by `h`.
pub fn loop_program() -> Fixture {
    let mut b = ProgramBuilder::new();
    let app = b.class("app.Main");
    let api = b.library_class("lib.Api");
    let main = b.static_method(app, "main");
    let open = b.static_method(api, "open");
    let read = b.static_method(api, "read");
    let close = b.static_method(api, "close");

    let a = b.static_call(main, 1, open);
    let h = b.plain(main, 2);
    let bb = b.static_call(main, 3, read);
    let x = b.plain(main, 4);
    let c = b.static_call(main, 5, close);
    let ret = b.plain(main, 6);
    b.chain(&[a, h, bb, h]).chain(&[h, x, h]).chain(&[h, c, ret]);
    b.call_edge(a, open).call_edge(bb, read).call_edge(c, close);
    b.entry(main);

    Fixture::new(
        b,
        &[("a", a), ("h", h), ("b", bb), ("x", x), ("c", c), ("ret", ret)],
    )
}

/// ```text
/// main:   call:helper() → send:send() → ret
/// helper: connect:connect() → hret
/// ```
pub fn interprocedural() -> Fixture {
    let mut b = ProgramBuilder::new();
    let app = b.class("app.Main");
    let net = b.library_class("lib.Net");
    let main = b.static_method(app, "main");
    let helper = b.static_method(app, "helper");
    let connect = b.static_method(net, "connect");
    let send = b.static_method(net, "send");

    let call = b.static_call(main, 1, helper);
    let send_call = b.static_call(main, 2, send);
    let ret = b.plain(main, 3);
    let connect_call = b.static_call(helper, 10, connect);
    let hret = b.plain(helper, 11);
    b.chain(&[call, send_call, ret]).chain(&[connect_call, hret]);
    b.call_edge(call, helper)
        .call_edge(send_call, send)
        .call_edge(connect_call, connect);
    b.entry(main);

    Fixture::new(
        b,
        &[
            ("call", call),
            ("send", send_call),
            ("ret", ret),
            ("connect", connect_call),
            ("hret", hret),
        ],
    )
}

/// ```text
/// main:   alloc: o = new Worker → ctor: o.<init>() → run: o.run() → ret
/// <init>: init_body
/// run:    api: Api.call() → run_ret
/// ```
pub fn single_allocation() -> Fixture {
    let mut b = ProgramBuilder::new();
    let app = b.class("app.Main");
    let worker = b.class("app.Worker");
    let lib = b.library_class("lib.Api");
    let main = b.static_method(app, "main");
    let init = b.constructor(worker);
    let run = b.instance_method(worker, "run");
    let api = b.static_method(lib, "call");

    let alloc = b.new_object(main, 1, "o", worker);
    let ctor = b.special_call(main, 2, "o", init);
    let run_call = b.virtual_call(main, 3, "o", run);
    let ret = b.plain(main, 4);
    let init_body = b.plain(init, 10);
    let api_call = b.static_call(run, 20, api);
    let run_ret = b.plain(run, 21);
    b.chain(&[alloc, ctor, run_call, ret]).chain(&[api_call, run_ret]);
    b.call_edge(ctor, init)
        .call_edge(run_call, run)
        .call_edge(api_call, api);
    let site = b.alloc_site(alloc, worker);
    b.points_to(main, "o", &[site]);
    b.entry(main);

    Fixture::new(
        b,
        &[
            ("alloc", alloc),
            ("ctor", ctor),
            ("run", run_call),
            ("ret", ret),
            ("init_body", init_body),
            ("api", api_call),
            ("run_ret", run_ret),
        ],
    )
}

/// ```text
/// main: call_f:f() → ret
/// f:    open:open() → rec:f() → close:close() → fret
///       open → close
/// ```
/// `f` calls itself between `open` and `close`.
pub fn recursive_call() -> Fixture {
    let mut b = ProgramBuilder::new();
    let app = b.class("app.Main");
    let api = b.library_class("lib.Api");
    let main = b.static_method(app, "main");
    let f = b.static_method(app, "f");
    let open = b.static_method(api, "open");
    let close = b.static_method(api, "close");

    let call_f = b.static_call(main, 1, f);
    let ret = b.plain(main, 2);
    let open_call = b.static_call(f, 10, open);
    let rec = b.static_call(f, 11, f);
    let close_call = b.static_call(f, 12, close);
    let fret = b.plain(f, 13);
    b.chain(&[call_f, ret])
        .chain(&[open_call, rec, close_call, fret])
        .chain(&[open_call, close_call]);
    b.call_edge(call_f, f)
        .call_edge(open_call, open)
        .call_edge(rec, f)
        .call_edge(close_call, close);
    b.entry(main);

    Fixture::new(
        b,
        &[
            ("call_f", call_f),
            ("ret", ret),
            ("open", open_call),
            ("rec", rec),
            ("close", close_call),
            ("fret", fret),
        ],
    )
}
