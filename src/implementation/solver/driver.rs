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

//! The algorithm driver (C9): Initialization (evaluate X0, seed barrier and
//! mesh) → while(¬terminate) { MegaIteration } → Termination. Owns every
//! other component and is the only public entry point that runs a solve.

use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::abstraction::evaluator::Evaluator;
use crate::abstraction::search_method::SearchMethod;
use crate::callbacks::Callbacks;
use crate::common::{EvaluatorKind, StopReason, StopReasonTree, SuccessType};
use crate::config::Parameters;
use crate::error::MadsResult;
use crate::implementation::barrier::progressive::ProgressiveBarrier;
use crate::implementation::cache::eval_point::EvalPoint;
use crate::implementation::cache::store::Cache;
use crate::implementation::iteration::mega_iteration::{run_mega_iteration, IterationContext};
use crate::implementation::mesh::granular::GranularMesh;
use crate::implementation::numeric::{effective_lower, effective_upper};
use crate::implementation::persistence::{cache_file, restart_file};
use crate::implementation::point::Point;
use crate::implementation::queue::simple::EvaluatorQueue;

/// Outcome of a completed `Solver::run`.
pub struct SolveReport {
    pub stop_reason: StopReason,
    pub best_feasible: Option<EvalPoint>,
    pub best_infeasible: Option<EvalPoint>,
    pub nb_eval: usize,
    pub nb_iterations: usize,
}

pub struct Solver<'a> {
    params: Parameters,
    evaluator: &'a dyn Evaluator,
    cache: Cache,
    barrier: ProgressiveBarrier,
    mesh: GranularMesh,
    search_methods: Vec<Box<dyn SearchMethod>>,
    callbacks: Callbacks,
    rng: StdRng,
    stop: StopReasonTree,
    iteration_count: usize,
    last_success_direction: Option<Vec<f64>>,
    started_at: Option<Instant>,
}

impl<'a> Solver<'a> {
    pub fn new(params: Parameters, evaluator: &'a dyn Evaluator) -> Self {
        let lower_bound: Vec<f64> = params.lower_bound.iter().map(|b| effective_lower(*b)).collect();
        let upper_bound: Vec<f64> = params.upper_bound.iter().map(|b| effective_upper(*b)).collect();
        let mesh = GranularMesh::new(
            params.granularity.clone(),
            lower_bound,
            upper_bound,
            params.initial_frame_size,
            params.anisotropic_mesh,
            params.anisotropic_ratio,
            params.min_mesh_size,
            params.min_frame_size,
        );
        let barrier = ProgressiveBarrier::new(params.h_max_0, EvaluatorKind::BlackBox);
        let rng = StdRng::seed_from_u64(params.seed);

        Solver {
            cache: Cache::new(),
            barrier,
            mesh,
            search_methods: Vec::new(),
            callbacks: Callbacks::new(),
            rng,
            stop: StopReasonTree::new(),
            iteration_count: 0,
            last_success_direction: None,
            started_at: None,
            params,
            evaluator,
        }
    }

    pub fn with_search_method(mut self, method: Box<dyn SearchMethod>) -> Self {
        self.search_methods.push(method);
        self
    }

    pub fn with_callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Loads a hot-restart file, reinstating the mesh, barrier, iteration
    /// counter, and RNG seed it captured. Must be called before `run`.
    pub fn restore_from(&mut self, path: impl AsRef<std::path::Path>) -> MadsResult<()> {
        let state = restart_file::load(path)?;
        self.iteration_count = state.iteration();
        self.rng = StdRng::seed_from_u64(state.seed());
        state.apply(&mut self.mesh, &self.barrier);
        Ok(())
    }

    /// Loads a cache file, pre-populating the cache so already-evaluated
    /// points are served without a fresh black-box call.
    pub fn preload_cache_from(&mut self, path: impl AsRef<std::path::Path>) -> MadsResult<()> {
        self.cache = cache_file::load(path)?;
        Ok(())
    }

    pub fn run(&mut self) -> MadsResult<SolveReport> {
        self.started_at = Some(Instant::now());
        self.initialize();

        while !self.should_stop() {
            self.one_mega_iteration();
        }

        if let Some(path) = &self.params.cache_file {
            cache_file::save(&self.cache, path)?;
        }

        let reason = self.stop.reason().unwrap_or(StopReason::MaxIterations);
        info!("driver: terminated, reason = {reason}");
        Ok(SolveReport {
            stop_reason: reason,
            best_feasible: self.barrier.best_feasible(),
            best_infeasible: self.barrier.best_infeasible(),
            nb_eval: self.cache.counted_bb_evals() as usize,
            nb_iterations: self.iteration_count,
        })
    }

    fn initialize(&mut self) {
        let x0 = Point::from_values(&self.params.x0);
        let candidates = vec![(x0, "initialization", None)];
        EvaluatorQueue::dispatch(
            &self.cache,
            self.evaluator,
            &self.barrier,
            &self.params.bb_output_type,
            self.params.eval_queue_sort.build(None, self.params.seed).as_ref(),
            candidates,
            Some(self.params.max_bb_eval),
            self.params.opportunism,
            self.params.block_size,
            self.params.nb_threads,
        );
        if self.barrier.best_feasible().is_none() && self.barrier.best_infeasible().is_none() {
            info!("driver: X0 produced no usable incumbent, continuing with an empty barrier");
        }
    }

    fn should_stop(&mut self) -> bool {
        if self.stop.terminate() {
            return true;
        }
        let counted_bb = self.cache.counted_bb_evals() as usize;
        if counted_bb >= self.params.max_bb_eval {
            self.stop.set_local(StopReason::MaxBbEval);
            return true;
        }
        if let Some(max_eval) = self.params.max_eval {
            if counted_bb + self.cache.cache_hits() as usize >= max_eval {
                self.stop.set_local(StopReason::MaxEval);
                return true;
            }
        }
        if let Some(max_time) = self.params.max_time {
            if let Some(started) = self.started_at {
                if started.elapsed() >= max_time {
                    self.stop.set_local(StopReason::MaxTime);
                    return true;
                }
            }
        }
        if self.mesh.check_termination() {
            self.stop.set_local(StopReason::MeshMinimized);
            return true;
        }
        false
    }

    fn one_mega_iteration(&mut self) {
        let frame_centers: Vec<Point> = self
            .barrier
            .frame_centers()
            .into_iter()
            .map(|ep| ep.point)
            .collect();
        if frame_centers.is_empty() {
            self.stop.set_local(StopReason::AllPointsEvaluated);
            return;
        }

        let sort_key = self.params.eval_queue_sort.build(self.last_success_direction.clone(), self.params.seed);
        let ctx = IterationContext {
            cache: &self.cache,
            evaluator: self.evaluator,
            barrier: &self.barrier,
            search_methods: &self.search_methods,
            direction_type: self.params.direction_type,
            output_types: &self.params.bb_output_type,
            sort_key: sort_key.as_ref(),
            max_bb_eval: Some(self.params.max_bb_eval),
            opportunism: self.params.opportunism,
            block_size: self.params.block_size,
            nb_threads: self.params.nb_threads,
            callbacks: &self.callbacks,
        };

        let outcome = run_mega_iteration(
            &frame_centers,
            &mut self.mesh,
            self.last_success_direction.as_deref(),
            &ctx,
            &mut self.rng,
        );

        self.iteration_count += 1;
        if outcome.success == SuccessType::FullSuccess {
            self.last_success_direction = outcome.success_direction;
        }
        if let Some(reason) = outcome.stop {
            self.stop.set_local(reason);
        }
    }
}
