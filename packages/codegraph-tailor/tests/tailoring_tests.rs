//! End-to-end tailoring over small programs

mod common;

use codegraph_tailor::features::tailoring::TailorState;
use codegraph_tailor::{TailorConfig, TailorError, TailoringOrchestrator};
use common::*;
use pretty_assertions::assert_eq;

fn plain_config() -> TailorConfig {
    TailorConfig::default().extend_sc(false)
}

#[test]
fn test_straight_line_criterion() {
    let f = straight_line();
    let result = f.tailor(&plain_config(), &[f.criterion(&["a", "b", "c"])]);

    assert_kept(&result, &f.ps(&["x", "a", "y", "b", "c"]));
    assert_not_kept(&result, &f.ps(&["z", "ret"]));
    assert_eq!(result.tail, f.p("c"));
    assert_eq!(result.criteria, vec![f.ps(&["a", "b", "c"])]);
}

#[test]
fn test_criterion_against_program_order_is_empty() {
    let f = straight_line();
    let result = f.tailor(&plain_config(), &[f.criterion(&["c", "a"])]);
    assert!(result.is_empty());
}

#[test]
fn test_loop_elision_drops_other_loop_arm() {
    let f = loop_program();
    let config = plain_config().retain_cycle(false);
    let result = f.tailor(&config, &[f.criterion(&["a", "b", "c"])]);

    assert_kept(&result, &f.ps(&["a", "h", "b", "c"]));
    assert_not_kept(&result, &f.ps(&["x"]));
}

#[test]
fn test_retained_loop_keeps_other_loop_arm() {
    let f = loop_program();
    let result = f.tailor(&plain_config(), &[f.criterion(&["a", "b", "c"])]);
    // with the loop intact, x runs between two iterations that reach b and c
    assert_kept(&result, &f.ps(&["a", "h", "b", "x", "c"]));
}

#[test]
fn test_recursion_blocked_without_cycles() {
    let f = recursive_call();
    let config = plain_config().retain_cycle(false);
    let result = f.tailor(&config, &[f.criterion(&["open", "close"])]);

    // the recursive call stays as a statement but is never entered, so
    // nothing past the outermost close is needed
    assert_kept(&result, &f.ps(&["call_f", "open", "rec", "close"]));
    assert_not_kept(&result, &f.ps(&["ret", "fret"]));
}

#[test]
fn test_recursion_retained() {
    let f = recursive_call();
    let result = f.tailor(&plain_config(), &[f.criterion(&["open", "close"])]);

    // an inner activation must return through fret before the outer close
    assert_kept(&result, &f.ps(&["call_f", "open", "rec", "close", "fret"]));
    assert_not_kept(&result, &f.ps(&["ret"]));
}

#[test]
fn test_criterion_across_methods() {
    let f = interprocedural();
    let result = f.tailor(&plain_config(), &[f.criterion(&["connect", "send"])]);

    assert_kept(&result, &f.ps(&["call", "send", "connect", "hret"]));
    assert_not_kept(&result, &f.ps(&["ret"]));
    assert_eq!(result.methods.len(), 2);
}

#[test]
fn test_runs_are_deterministic() {
    let f = loop_program();
    let config = plain_config().retain_cycle(false);
    let criteria = [f.criterion(&["a", "b", "c"]), f.criterion(&["b", "c"])];

    let first = f.tailor(&config, &criteria);
    let second = f.tailor(&config, &criteria);
    assert_eq!(first, second);
}

#[test]
fn test_extension_through_constructor_call() {
    let f = single_allocation();
    let config = TailorConfig::default();
    let mut orchestrator = TailoringOrchestrator::new(
        &f.program,
        &f.program,
        &config,
        f.p("api"),
        &[f.criterion(&["api"])],
    )
    .unwrap();

    let extension = orchestrator.criterion_sets().extension();
    let exts: Vec<_> = extension[&f.p("api")].iter().copied().collect();
    assert_eq!(exts, vec![f.p("ctor")]);

    let result = orchestrator.run().unwrap();
    assert_kept(
        result,
        &f.ps(&["alloc", "ctor", "run", "init_body", "api"]),
    );
    assert_not_kept(result, &f.ps(&["ret", "run_ret"]));
}

#[test]
fn test_result_before_run_is_a_state_error() {
    let f = straight_line();
    let config = plain_config();
    let orchestrator =
        TailoringOrchestrator::new(&f.program, &f.program, &config, f.p("c"), &[f.criterion(&["a", "c"])])
            .unwrap();
    assert_eq!(orchestrator.state(), TailorState::Built);
    assert!(matches!(
        orchestrator.into_result(),
        Err(TailorError::State {
            expected: "Done",
            found: "Built"
        })
    ));
}
