//! Tailoring benchmarks
//!
//! Synthetic programs: `main` calls `n` helpers in sequence, each helper
//! loops over a library call. The criterion spans the first and last
//! helper, so both passes walk the whole call chain.

use codegraph_tailor::features::fact_model::StatementSequence;
use codegraph_tailor::{PointId, Program, ProgramBuilder, TailorConfig, TailoringOrchestrator};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

// ============================================================================
// Program generation
// ============================================================================

fn chain_program(helpers: usize) -> (Program, PointId, PointId) {
    let mut b = ProgramBuilder::new();
    let app = b.class("bench.Main");
    let api = b.library_class("lib.Api");
    let main = b.static_method(app, "main");
    let read = b.static_method(api, "read");

    let mut main_body = Vec::with_capacity(helpers + 1);
    let mut api_calls = Vec::with_capacity(helpers);
    for i in 0..helpers {
        let helper = b.static_method(app, &format!("helper{}", i));
        let base = (i as i32 + 1) * 10;
        let head = b.plain(helper, base);
        let call = b.static_call(helper, base + 1, read);
        let exit = b.plain(helper, base + 2);
        b.chain(&[head, call, head]).chain(&[head, exit]);
        b.call_edge(call, read);
        api_calls.push(call);

        let site = b.static_call(main, i as i32 + 1, helper);
        b.call_edge(site, helper);
        main_body.push(site);
    }
    main_body.push(b.plain(main, helpers as i32 + 1));
    b.chain(&main_body);
    b.entry(main);

    let first = api_calls[0];
    let last = api_calls[helpers - 1];
    (b.build().expect("generated program is well formed"), first, last)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_tailor_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("tailor_chain");

    for helpers in [8usize, 32, 128] {
        let (program, first, last) = chain_program(helpers);
        let criterion = StatementSequence::from_points(vec![first, last]);
        group.throughput(Throughput::Elements(helpers as u64));

        for retain_cycle in [true, false] {
            let config = TailorConfig::default().extend_sc(false).retain_cycle(retain_cycle);
            let id = format!("{}/retain_cycle={}", helpers, retain_cycle);
            group.bench_with_input(BenchmarkId::from_parameter(id), &helpers, |b, _| {
                b.iter(|| {
                    let mut orchestrator = TailoringOrchestrator::new(
                        &program,
                        &program,
                        &config,
                        last,
                        std::slice::from_ref(&criterion),
                    )
                    .unwrap();
                    orchestrator.run().unwrap();
                    black_box(orchestrator.into_result().unwrap())
                });
            });
        }
    }

    group.finish();
}

fn bench_orchestrator_setup(c: &mut Criterion) {
    let (program, first, last) = chain_program(64);
    let criterion = StatementSequence::from_points(vec![first, last]);
    let config = TailorConfig::default();

    c.bench_function("orchestrator_setup_64", |b| {
        b.iter(|| {
            let orchestrator = TailoringOrchestrator::new(
                &program,
                &program,
                &config,
                last,
                std::slice::from_ref(&criterion),
            )
            .unwrap();
            black_box(orchestrator.state())
        });
    });
}

criterion_group!(benches, bench_tailor_chain, bench_orchestrator_setup);
criterion_main!(benches);
