//! End-to-end scenarios against the full `Solver::run` loop. Each test
//! stands up a small black box in-process and checks the driver's reported
//! outcome, not a particular internal code path.

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use mads::abstraction::EvalOutcome;
use mads::common::{EvaluatorKind, OutputType, StopReason};
use mads::config::ParametersBuilder;
use mads::implementation::barrier::progressive::ProgressiveBarrier;
use mads::implementation::cache::store::Cache;
use mads::implementation::point::Point;
use mads::implementation::queue::simple::EvaluatorQueue;
use mads::implementation::queue::sort_keys::SortKeyKind;
use mads::implementation::solver::driver::Solver;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// S1: unconstrained 5-d, minimise the fourth coordinate with a lower bound
/// of -6 on every coordinate. Ortho-2n should walk x4 down to the bound and
/// stop either on min-mesh or the evaluation budget.
#[test]
fn s1_unconstrained_quadratic_reaches_the_lower_bound() {
    init_logging();

    let mut builder = ParametersBuilder::default();
    builder
        .dimension(5)
        .x0(vec![0.0; 5])
        .lower_bound(vec![Some(-6.0); 5])
        .upper_bound(vec![Some(5.0), Some(6.0), Some(7.0), None, None])
        .bb_output_type(vec![OutputType::Objective])
        .max_bb_eval(1000)
        .seed(7);
    let params = builder.build().unwrap();

    let bb = |p: &Point| EvalOutcome::success(vec![p.values()[3]]);

    let mut solver = Solver::new(params, &bb);
    let report = solver.run().unwrap();

    let best = report.best_feasible.expect("a feasible incumbent must be found");
    assert!(best.f(EvaluatorKind::BlackBox) <= -5.999);
    assert!(matches!(
        report.stop_reason,
        StopReason::MeshMinimized | StopReason::MaxBbEval
    ));
}

/// S2: a progressive-barrier constraint that X0 violates. The solver must
/// still settle on a feasible incumbent, driving h down to zero.
#[test]
fn s2_progressive_barrier_finds_a_feasible_incumbent() {
    init_logging();

    let mut builder = ParametersBuilder::default();
    builder
        .dimension(5)
        .x0(vec![0.0; 5])
        .lower_bound(vec![Some(-6.0); 5])
        .upper_bound(vec![Some(5.0), Some(6.0), Some(7.0), None, None])
        .bb_output_type(vec![
            OutputType::Objective,
            OutputType::ProgressiveBarrier,
            OutputType::ProgressiveBarrier,
        ])
        .max_bb_eval(2000)
        .seed(11);
    let params = builder.build().unwrap();

    let bb = |p: &Point| {
        let v = p.values();
        let obj = v[3];
        let c1 = v.iter().map(|x| (x - 1.0).powi(2)).sum::<f64>() - 25.0;
        let c2 = 25.0 - v.iter().map(|x| (x + 1.0).powi(2)).sum::<f64>();
        EvalOutcome::success(vec![obj, c1, c2])
    };

    let mut solver = Solver::new(params, &bb);
    let report = solver.run().unwrap();

    assert!(report.best_feasible.is_some(), "expected a feasible incumbent to emerge");
}

/// S5: submitting the same point to the Queue twice in a row must hit the
/// cache on the second call — the black box itself is invoked only once,
/// and the budget is not charged twice.
#[test]
fn s5_repeated_submission_is_served_from_cache() {
    init_logging();

    let cache = Cache::new();
    let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
    let output_types = [OutputType::Objective];
    let sort_key = SortKeyKind::Lexicographic.build(None, 0);

    let calls = AtomicUsize::new(0);
    let bb = |p: &Point| {
        calls.fetch_add(1, AtomicOrdering::SeqCst);
        EvalOutcome::success(vec![p.values().iter().map(|x| x * x).sum()])
    };

    let x0 = Point::from_values(&[1.0, 2.0]);
    let dispatch_once = |point: Point| {
        EvaluatorQueue::dispatch(
            &cache,
            &bb,
            &barrier,
            &output_types,
            sort_key.as_ref(),
            vec![(point, "initialization", None)],
            None,
            false,
            1,
            1,
        )
    };

    dispatch_once(x0.clone());
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    assert_eq!(cache.len(), 1);

    dispatch_once(x0);
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1, "second submission must be served from cache");
    assert_eq!(cache.len(), 1);
}

/// Property 7: two runs with identical parameters, seed, and a deterministic
/// evaluator must agree on the best feasible incumbent found.
#[test]
fn reproducibility_same_seed_same_outcome() {
    init_logging();

    let make_params = || {
        let mut builder = ParametersBuilder::default();
        builder
            .dimension(3)
            .x0(vec![2.0, -1.0, 4.0])
            .bb_output_type(vec![OutputType::Objective])
            .max_bb_eval(300)
            .seed(42);
        builder.build().unwrap()
    };
    let bb = |p: &Point| EvalOutcome::success(vec![p.values().iter().map(|x| x * x).sum()]);

    let mut solver_a = Solver::new(make_params(), &bb);
    let report_a = solver_a.run().unwrap();
    let mut solver_b = Solver::new(make_params(), &bb);
    let report_b = solver_b.run().unwrap();

    assert_eq!(report_a.nb_eval, report_b.nb_eval);
    assert_eq!(
        report_a.best_feasible.unwrap().f(EvaluatorKind::BlackBox),
        report_b.best_feasible.unwrap().f(EvaluatorKind::BlackBox)
    );
}
