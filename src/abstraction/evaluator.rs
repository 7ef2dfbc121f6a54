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

//! Defines the `Evaluator` trait: the opaque black box. A client provides
//! one implementation (an in-process closure, or the batch adapter in
//! `implementation::blackbox` that shells out to an external program) and
//! the rest of the engine never needs to know which.

use crate::implementation::point::Point;

/// Outcome of evaluating one trial point.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    /// `true` if the black box produced a usable numeric output vector.
    pub ok: bool,
    /// Whether this call consumes the MAX_BB_EVAL budget — the user decides,
    /// e.g. a point served from an external warm-start cache may not count.
    pub counts: bool,
    /// The raw output vector, in BB_OUTPUT_TYPE order, when `ok` is true.
    pub outputs: Vec<f64>,
}
impl EvalOutcome {
    pub fn failed() -> Self {
        EvalOutcome { ok: false, counts: true, outputs: Vec::new() }
    }
    pub fn success(outputs: Vec<f64>) -> Self {
        EvalOutcome { ok: true, counts: true, outputs }
    }
}

/// The black box (or a surrogate/model standing in for it). Implementors
/// receive a whole block of trial points at once so that a batch-mode
/// external process only needs to be spawned once per block.
pub trait Evaluator: Send + Sync {
    /// Evaluate every point of `block`, returning one `EvalOutcome` per
    /// input, in the same order.
    fn eval_block(&self, block: &[Point]) -> Vec<EvalOutcome>;
}

/// Blanket impl so a plain closure can be used as an `Evaluator` directly,
/// evaluating each point independently (no genuine batching).
impl<F> Evaluator for F
where
    F: Fn(&Point) -> EvalOutcome + Send + Sync,
{
    fn eval_block(&self, block: &[Point]) -> Vec<EvalOutcome> {
        block.iter().map(|p| self(p)).collect()
    }
}
