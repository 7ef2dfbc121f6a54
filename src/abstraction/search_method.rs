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

//! Defines the `SearchMethod` hook that C7 dispatches, in declaration order,
//! before the Poll runs. The quadratic-model and Nelder–Mead methods are out
//! of scope: only the trait they would implement is specified here.

use crate::implementation::barrier::progressive::ProgressiveBarrier;
use crate::implementation::mesh::granular::GranularMesh;
use crate::implementation::point::Point;

/// Whether a search method demands a strict (must beat the incumbent) or
/// lenient (any progress counts) success classification from the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrictness {
    Strict,
    Lenient,
}

pub trait SearchMethod: Send + Sync {
    /// A short, stable name used in logs and in deterministic ordering.
    fn name(&self) -> &str;

    /// Propose zero or more trial points given the current barrier and mesh.
    fn generate(&self, barrier: &ProgressiveBarrier, mesh: &GranularMesh) -> Vec<Point>;

    fn strictness(&self) -> SearchStrictness {
        SearchStrictness::Lenient
    }

    /// Notifies this search method that a Mega-Iteration ended in a full
    /// success at `frame_center` along `direction`. Most methods ignore
    /// this; `SpeculativeSearch` and `LatinHypercubeSearch` use it to
    /// remember state across Mega-Iterations without the driver needing to
    /// know their concrete type.
    fn on_success(&self, _frame_center: &Point, _direction: &[f64]) {}

    /// Notifies this search method that a Mega-Iteration just ended,
    /// regardless of its outcome. `LatinHypercubeSearch` uses this to grow
    /// its sample density iteration over iteration.
    fn on_iteration_end(&self) {}
}
