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

//! # mads
//!
//! `mads` is a generic, parallel Mesh Adaptive Direct Search engine for
//! derivative-free, constrained, mixed continuous/integer black-box
//! optimization. It does not assume anything about the objective or
//! constraint functions beyond "can be evaluated at a point"; the caller
//! supplies an [`Evaluator`](abstraction::Evaluator) — an in-process closure
//! or the batch adapter in [`implementation::blackbox`] that shells out to
//! an external program — and the engine drives Search, Poll, the barrier,
//! and the mesh around it.
//!
//! ## Quick example
//!
//! ```
//! use mads::config::ParametersBuilder;
//! use mads::common::OutputType;
//! use mads::abstraction::EvalOutcome;
//! use mads::implementation::solver::driver::Solver;
//!
//! let mut builder = ParametersBuilder::default();
//! builder
//!     .dimension(2)
//!     .x0(vec![3.0, 3.0])
//!     .bb_output_type(vec![OutputType::Objective])
//!     .max_bb_eval(200);
//! let params = builder.build().unwrap();
//!
//! let sphere = |p: &mads::implementation::point::Point| {
//!     let v = p.values();
//!     EvalOutcome::success(vec![v.iter().map(|x| x * x).sum()])
//! };
//!
//! let mut solver = Solver::new(params, &sphere);
//! let report = solver.run().unwrap();
//! assert!(report.best_feasible.is_some());
//! ```
//!
//! ## Layout
//!
//! - [`common`]: small value types shared everywhere (`SuccessType`,
//!   `StopReason`, ...).
//! - [`config`]: the validated `Parameters` option table.
//! - [`error`]: the fatal `MadsError` hierarchy.
//! - [`callbacks`]: optional user hook points.
//! - [`abstraction`]: the traits a caller plugs into (`Evaluator`,
//!   `SearchMethod`, `EvalSortKey`).
//! - [`implementation`]: every concrete piece — point, mesh, cache, barrier,
//!   evaluator queue, poll, search, iteration, solver driver, the black-box
//!   batch protocol, and cache/restart-file persistence.

pub mod common;
pub mod error;
pub mod config;
pub mod callbacks;
pub mod abstraction;
pub mod implementation;

pub use callbacks::Callbacks;
pub use config::{Parameters, ParametersBuilder};
pub use error::{MadsError, MadsResult};
pub use implementation::solver::driver::{SolveReport, Solver};
