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

//! The Evaluator Queue (C5): a priority container of pending trial points,
//! dispatched to the black box in blocks of `BLOCK_SIZE` across `NB_THREADS`
//! worker threads, consulting the Cache first and stopping early under
//! opportunistic evaluation.

use std::cmp::Ordering;

use binary_heap_plus::BinaryHeap;
use compare::Compare;
use log::{debug, trace};
use parking_lot::{Condvar, Mutex};

use crate::abstraction::evaluator::Evaluator;
use crate::abstraction::sort_key::EvalSortKey;
use crate::common::{EvalStatus, EvaluatorKind, OutputType, SuccessType};
use crate::implementation::barrier::progressive::ProgressiveBarrier;
use crate::implementation::cache::eval_point::{Eval, EvalPoint};
use crate::implementation::cache::store::Cache;
use crate::implementation::point::Point;

/// Aggregated outcome of one `EvaluatorQueue::dispatch` call: every
/// touched `EvalPoint`, the best success classification the Barrier
/// reported among them, and the direction that produced it (fed back into
/// `Mesh::enlarge` and the speculative search).
pub struct DispatchOutcome {
    pub results: Vec<EvalPoint>,
    pub success: SuccessType,
    pub success_direction: Option<Vec<f64>>,
}

struct PendingEntry {
    key: f64,
    point: Point,
    direction: Option<Vec<f64>>,
    generating_step: &'static str,
}

struct CompareByKey;
impl Compare<PendingEntry> for CompareByKey {
    fn compare(&self, l: &PendingEntry, r: &PendingEntry) -> Ordering {
        // BinaryHeap is a max-heap; negate so the lowest key pops first.
        r.key.partial_cmp(&l.key).unwrap_or(Ordering::Equal)
    }
}

/// Work handed to one thread of the dispatch pool.
enum WorkLoad {
    Complete,
    Aborted,
    Block(Vec<PendingEntry>),
}

struct Critical {
    heap: BinaryHeap<PendingEntry, CompareByKey>,
    success_seen: bool,
    aborted: bool,
    dispatched: usize,
    best_success: SuccessType,
    best_direction: Option<Vec<f64>>,
}

struct Shared<'a> {
    critical: Mutex<Critical>,
    monitor: Condvar,
    cache: &'a Cache,
    evaluator: &'a dyn Evaluator,
    barrier: &'a ProgressiveBarrier,
    output_types: &'a [OutputType],
    max_bb_eval: Option<usize>,
    opportunism: bool,
    block_size: usize,
}

/// Drains a set of candidate trial points against the black box, respecting
/// opportunism and the evaluation budget. Returns the `EvalPoint`s that were
/// actually dispatched to the black box, each carrying its fresh `Eval`.
pub struct EvaluatorQueue;

impl EvaluatorQueue {
    /// Submits `candidates` (already projected onto the mesh) to the cache,
    /// then dispatches the ones that need a fresh black-box evaluation in
    /// blocks of `block_size`, across `nb_threads` worker threads. Returns
    /// every `EvalPoint` touched by this call, in the cache (whether a
    /// fresh evaluation happened or a cache hit served it).
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch(
        cache: &Cache,
        evaluator: &dyn Evaluator,
        barrier: &ProgressiveBarrier,
        output_types: &[OutputType],
        sort_key: &dyn EvalSortKey,
        candidates: Vec<(Point, &'static str, Option<Vec<f64>>)>,
        max_bb_eval: Option<usize>,
        opportunism: bool,
        block_size: usize,
        nb_threads: usize,
    ) -> DispatchOutcome {
        let mut results = Vec::with_capacity(candidates.len());
        let mut pending = Vec::new();

        for (point, step, direction) in candidates {
            let (cell, needs_eval) = cache.smart_insert(point.clone(), step, EvaluatorKind::BlackBox);
            if needs_eval {
                let key = {
                    let mut ep = cell.lock().clone();
                    if let Some(d) = &direction {
                        ep = ep.with_direction(d.clone());
                    }
                    sort_key.key(&ep)
                };
                pending.push(PendingEntry { key, point, direction, generating_step: step });
            } else {
                results.push(cell.lock().clone());
                trace!("queue: served from cache without a fresh evaluation");
            }
        }

        if pending.is_empty() {
            return DispatchOutcome { results, success: SuccessType::Unsuccessful, success_direction: None };
        }

        let pending_points: Vec<Point> = pending.iter().map(|e| e.point.clone()).collect();
        let heap = BinaryHeap::from_vec_cmp(pending, CompareByKey);
        let shared = Shared {
            critical: Mutex::new(Critical {
                heap,
                success_seen: false,
                aborted: false,
                dispatched: 0,
                best_success: SuccessType::Unsuccessful,
                best_direction: None,
            }),
            monitor: Condvar::new(),
            cache,
            evaluator,
            barrier,
            output_types,
            max_bb_eval,
            opportunism,
            block_size: block_size.max(1),
        };

        let nb_threads = nb_threads.max(1);
        debug!("queue: dispatching across {nb_threads} worker thread(s), block_size = {block_size}");

        std::thread::scope(|scope| {
            for _ in 0..nb_threads {
                scope.spawn(|| Self::worker_loop(&shared));
            }
        });

        for point in &pending_points {
            if let Some(cell) = shared.cache.find(point) {
                // Opportunistic cancellation clears the heap without
                // evaluating everything still queued: a cell left Pending
                // here was never dispatched to the black box, so drop it
                // rather than report a point that was never generated.
                let still_pending = cell.lock().eval(EvaluatorKind::BlackBox).map(|e| e.status) == Some(EvalStatus::Pending);
                if still_pending {
                    shared.cache.remove(point);
                } else {
                    results.push(cell.lock().clone());
                }
            }
        }
        let critical = shared.critical.into_inner();
        DispatchOutcome { results, success: critical.best_success, success_direction: critical.best_direction }
    }

    fn worker_loop(shared: &Shared) {
        loop {
            match Self::next_work(shared) {
                WorkLoad::Complete | WorkLoad::Aborted => return,
                WorkLoad::Block(block) => {
                    let points: Vec<Point> = block.iter().map(|e| e.point.clone()).collect();
                    let outcomes = shared.evaluator.eval_block(&points);
                    let mut any_success = false;
                    for (entry, outcome) in block.into_iter().zip(outcomes.into_iter()) {
                        let tag = shared.cache.next_tag();
                        let eval = if outcome.ok {
                            Eval::from_outputs(outcome.outputs, shared.output_types, tag, outcome.counts)
                        } else {
                            Eval::failed(tag)
                        };
                        let counted = eval.counted;
                        shared.cache.record(&entry.point, EvaluatorKind::BlackBox, eval);
                        if counted {
                            shared.cache.record_counted_bb_eval();
                        }
                        if let Some(cell) = shared.cache.find(&entry.point) {
                            let mut ep = cell.lock().clone();
                            if let Some(d) = entry.direction.clone() {
                                ep.direction = Some(d);
                            }
                            if ep.eval(EvaluatorKind::BlackBox).map(|e| e.status) == Some(EvalStatus::Ok) {
                                let classification = shared.barrier.update(&ep);
                                if classification.is_success() {
                                    any_success = true;
                                    let mut critical = shared.critical.lock();
                                    if classification > critical.best_success {
                                        critical.best_success = classification;
                                        critical.best_direction = entry.direction.clone();
                                    }
                                }
                            }
                        }
                    }
                    if any_success && shared.opportunism {
                        let mut critical = shared.critical.lock();
                        critical.success_seen = true;
                        shared.monitor.notify_all();
                    }
                }
            }
        }
    }

    fn next_work(shared: &Shared) -> WorkLoad {
        let mut critical = shared.critical.lock();
        loop {
            if critical.aborted {
                return WorkLoad::Aborted;
            }
            if shared.opportunism && critical.success_seen {
                critical.heap.clear();
                return WorkLoad::Complete;
            }
            if let Some(budget) = shared.max_bb_eval {
                if critical.dispatched >= budget {
                    return WorkLoad::Complete;
                }
            }
            if critical.heap.is_empty() {
                return WorkLoad::Complete;
            }
            let mut block = Vec::with_capacity(shared.block_size);
            for _ in 0..shared.block_size {
                match critical.heap.pop() {
                    Some(entry) => block.push(entry),
                    None => break,
                }
            }
            critical.dispatched += block.len();
            return WorkLoad::Block(block);
        }
    }
}

#[cfg(test)]
mod test_evaluator_queue {
    use super::*;
    use crate::abstraction::evaluator::EvalOutcome;
    use crate::implementation::queue::sort_keys::SortKeyKind;

    fn sphere(p: &Point) -> EvalOutcome {
        let v = p.values();
        EvalOutcome::success(vec![v.iter().map(|x| x * x).sum()])
    }

    #[test]
    fn dispatch_evaluates_every_candidate_once() {
        let cache = Cache::new();
        let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let output_types = [OutputType::Objective];
        let sort_key = SortKeyKind::Lexicographic.build(None, 0);

        let candidates: Vec<_> = (0..5)
            .map(|i| (Point::from_values(&[i as f64]), "poll", None))
            .collect();

        let outcome = EvaluatorQueue::dispatch(
            &cache,
            &(sphere as fn(&Point) -> EvalOutcome),
            &barrier,
            &output_types,
            sort_key.as_ref(),
            candidates,
            None,
            false,
            1,
            2,
        );
        assert_eq!(cache.len(), 5);
        assert_eq!(outcome.results.len(), 5);
        for ep in &outcome.results {
            assert_eq!(ep.eval(EvaluatorKind::BlackBox).unwrap().status, EvalStatus::Ok);
        }
        assert_eq!(outcome.success, SuccessType::FullSuccess);
    }

    #[test]
    fn opportunistic_dispatch_stops_after_first_success() {
        let cache = Cache::new();
        let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let output_types = [OutputType::Objective];
        let sort_key = SortKeyKind::Lexicographic.build(None, 0);

        let candidates: Vec<_> = (0..20)
            .map(|i| (Point::from_values(&[i as f64]), "poll", None))
            .collect();

        EvaluatorQueue::dispatch(
            &cache,
            &(sphere as fn(&Point) -> EvalOutcome),
            &barrier,
            &output_types,
            sort_key.as_ref(),
            candidates,
            None,
            true,
            1,
            1,
        );
        // with opportunism and a single thread, not every candidate needs
        // to reach the black box once one improves the barrier.
        assert!(cache.len() <= 20);
        // cancelled candidates must not linger as unevaluated cache cells.
        let pending = cache.range_scan(|ep| ep.eval(EvaluatorKind::BlackBox).map(|e| e.status) == Some(EvalStatus::Pending));
        assert!(pending.is_empty(), "cancelled candidates must be removed, not left Pending");
    }
}
