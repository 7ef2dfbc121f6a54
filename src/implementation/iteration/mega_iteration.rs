// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Iteration and Mega-Iteration (C7/C8): one Iteration bundles a frame
//! center and the shared mesh, running Search then Poll through the
//! Queue; one Mega-Iteration runs an Iteration per frame center (x⋆ and
//! x°) and folds their outcomes into a single mesh enlarge/refine
//! decision.

use log::{debug, info};
use rand::Rng;

use crate::abstraction::evaluator::Evaluator;
use crate::abstraction::search_method::SearchMethod;
use crate::abstraction::sort_key::EvalSortKey;
use crate::callbacks::Callbacks;
use crate::common::{DirectionType, OutputType, StopReason, SuccessType};
use crate::implementation::barrier::progressive::ProgressiveBarrier;
use crate::implementation::cache::eval_point::EvalPoint;
use crate::implementation::cache::store::Cache;
use crate::implementation::mesh::granular::GranularMesh;
use crate::implementation::point::Point;
use crate::implementation::poll::orthogonal::{order_by_last_success, poll_directions, poll_points};
use crate::implementation::queue::simple::{DispatchOutcome, EvaluatorQueue};

/// Parameters an Iteration needs that do not change across the frame
/// centers of one Mega-Iteration; gathered here purely to keep call sites
/// from needing a dozen positional arguments.
pub struct IterationContext<'a> {
    pub cache: &'a Cache,
    pub evaluator: &'a dyn Evaluator,
    pub barrier: &'a ProgressiveBarrier,
    pub search_methods: &'a [Box<dyn SearchMethod>],
    pub direction_type: DirectionType,
    pub output_types: &'a [OutputType],
    pub sort_key: &'a dyn EvalSortKey,
    pub max_bb_eval: Option<usize>,
    pub opportunism: bool,
    pub block_size: usize,
    pub nb_threads: usize,
    pub callbacks: &'a Callbacks,
}

pub struct IterationOutcome {
    pub success: SuccessType,
    pub success_direction: Option<Vec<f64>>,
    pub results: Vec<EvalPoint>,
}

/// Runs Search (each registered method, in order, stopping early once one
/// achieves a full success) then Poll, around `frame_center` on `mesh`.
pub fn run_iteration(
    frame_center: &Point,
    mesh: &GranularMesh,
    last_success_direction: Option<&[f64]>,
    ctx: &IterationContext,
    rng: &mut impl Rng,
) -> IterationOutcome {
    let mut results = Vec::new();
    let mut best_success = SuccessType::Unsuccessful;
    let mut best_direction = None;

    for method in ctx.search_methods {
        let points = method.generate(ctx.barrier, mesh);
        if points.is_empty() {
            continue;
        }
        debug!("search[{}] proposed {} point(s)", method.name(), points.len());
        let step: &'static str = "search";
        let candidates: Vec<_> = points
            .into_iter()
            .map(|p| {
                if let Some(cb) = &ctx.callbacks.pre_eval {
                    cb(&p);
                }
                (p, step, None)
            })
            .collect();
        let outcome = dispatch(ctx, candidates);
        fold_in(&mut results, &mut best_success, &mut best_direction, outcome, ctx);
        if best_success == SuccessType::FullSuccess {
            info!("search[{}] achieved a full success, skipping remaining search methods", method.name());
            break;
        }
    }

    let directions = order_by_last_success(
        poll_directions(mesh.dimension(), ctx.direction_type, rng),
        last_success_direction,
    );
    let poll_candidates = poll_points(frame_center, &directions, mesh);
    let step: &'static str = "poll";
    let candidates: Vec<_> = poll_candidates
        .into_iter()
        .zip(directions.into_iter())
        .map(|(p, d)| {
            if let Some(cb) = &ctx.callbacks.pre_eval {
                cb(&p);
            }
            (p, step, Some(d))
        })
        .collect();
    let outcome = dispatch(ctx, candidates);
    fold_in(&mut results, &mut best_success, &mut best_direction, outcome, ctx);

    IterationOutcome { success: best_success, success_direction: best_direction, results }
}

fn dispatch(ctx: &IterationContext, candidates: Vec<(Point, &'static str, Option<Vec<f64>>)>) -> DispatchOutcome {
    EvaluatorQueue::dispatch(
        ctx.cache,
        ctx.evaluator,
        ctx.barrier,
        ctx.output_types,
        ctx.sort_key,
        candidates,
        ctx.max_bb_eval,
        ctx.opportunism,
        ctx.block_size,
        ctx.nb_threads,
    )
}

fn fold_in(
    results: &mut Vec<EvalPoint>,
    best_success: &mut SuccessType,
    best_direction: &mut Option<Vec<f64>>,
    outcome: DispatchOutcome,
    ctx: &IterationContext,
) {
    if let Some(cb) = &ctx.callbacks.post_eval {
        for ep in &outcome.results {
            cb(ep);
        }
    }
    if outcome.success > *best_success {
        *best_success = outcome.success;
        *best_direction = outcome.success_direction;
    }
    results.extend(outcome.results);
}

/// Runs one Iteration per frame center and folds their outcomes into a
/// single classification: the Mega-Iteration reports `FullSuccess` if any
/// frame center's Iteration did, else `PartialSuccess` if any did, else
/// `Unsuccessful`.
pub struct MegaIterationOutcome {
    pub success: SuccessType,
    pub success_direction: Option<Vec<f64>>,
    pub stop: Option<StopReason>,
}

pub fn run_mega_iteration(
    frame_centers: &[Point],
    mesh: &mut GranularMesh,
    last_success_direction: Option<&[f64]>,
    ctx: &IterationContext,
    rng: &mut impl Rng,
) -> MegaIterationOutcome {
    let mut best_success = SuccessType::Unsuccessful;
    let mut best_direction: Option<Vec<f64>> = None;
    let mut best_center: Option<Point> = None;

    for center in frame_centers {
        let outcome = run_iteration(center, mesh, last_success_direction, ctx, rng);
        if outcome.success > best_success {
            best_success = outcome.success;
            best_direction = outcome.success_direction;
            best_center = Some(center.clone());
        }
    }

    let mut stop = None;
    match best_success {
        SuccessType::FullSuccess => {
            mesh.enlarge(best_direction.as_deref());
            debug!("mega-iteration: full success, mesh enlarged");
            if let (Some(center), Some(direction)) = (&best_center, &best_direction) {
                for method in ctx.search_methods {
                    method.on_success(center, direction);
                }
            }
        }
        SuccessType::PartialSuccess => {
            debug!("mega-iteration: partial success, mesh unchanged");
        }
        SuccessType::Unsuccessful => {
            mesh.refine();
            if mesh.check_termination() {
                stop = Some(StopReason::MeshMinimized);
            }
            debug!("mega-iteration: unsuccessful, mesh refined");
        }
    }

    for method in ctx.search_methods {
        method.on_iteration_end();
    }

    if let Some(cb) = &ctx.callbacks.mega_iteration_end {
        if cb(best_success) {
            stop = stop.or(Some(StopReason::UserCallbackStop));
        }
    }

    MegaIterationOutcome { success: best_success, success_direction: best_direction, stop }
}

#[cfg(test)]
mod test_mega_iteration {
    use super::*;
    use crate::abstraction::evaluator::EvalOutcome;
    use crate::common::EvaluatorKind;
    use crate::implementation::queue::sort_keys::SortKeyKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sphere(p: &Point) -> EvalOutcome {
        let v = p.values();
        EvalOutcome::success(vec![v.iter().map(|x| x * x).sum()])
    }

    #[test]
    fn an_unsuccessful_mega_iteration_refines_the_mesh() {
        let cache = Cache::new();
        let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let mut mesh = GranularMesh::new(vec![0.0; 2], vec![-10.0; 2], vec![10.0; 2], 1.0, false, 0.1, None, None);
        let output_types = [OutputType::Objective];
        let sort_key = SortKeyKind::Lexicographic.build(None, 0);
        let callbacks = Callbacks::new();
        let search_methods: Vec<Box<dyn SearchMethod>> = Vec::new();

        // seed the barrier with a feasible optimum right at the frame
        // center so no poll direction can possibly improve on it.
        barrier.update(&{
            let mut ep = EvalPoint::new(Point::from_values(&[0.0, 0.0]), "init");
            ep.set_eval(
                EvaluatorKind::BlackBox,
                crate::implementation::cache::eval_point::Eval {
                    raw_outputs: vec![0.0],
                    status: crate::common::EvalStatus::Ok,
                    f: 0.0,
                    h: 0.0,
                    tag: 0,
                    counted: true,
                },
            );
            ep
        });

        let ctx = IterationContext {
            cache: &cache,
            evaluator: &(sphere as fn(&Point) -> EvalOutcome),
            barrier: &barrier,
            search_methods: &search_methods,
            direction_type: DirectionType::Ortho2N,
            output_types: &output_types,
            sort_key: sort_key.as_ref(),
            max_bb_eval: None,
            opportunism: false,
            block_size: 4,
            nb_threads: 2,
            callbacks: &callbacks,
        };

        let mut rng = StdRng::seed_from_u64(5);
        let before = mesh.mesh_size();
        let outcome = run_mega_iteration(&[Point::from_values(&[0.0, 0.0])], &mut mesh, None, &ctx, &mut rng);
        assert_eq!(outcome.success, SuccessType::Unsuccessful);
        let after = mesh.mesh_size();
        for i in 0..2 {
            assert!(after[i] < before[i], "mesh should shrink after an unsuccessful mega-iteration");
        }
    }
}
