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

//! `Eval` and `EvalPoint`: the unit of record the Cache stores against a
//! `Point`, and the trial point wrapper carried through Search/Poll/Queue.

use serde::{Deserialize, Serialize};

use crate::common::{EvalStatus, EvaluatorKind, OutputType};
use crate::implementation::point::Point;

/// The record of one evaluator's attempt on a point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eval {
    pub raw_outputs: Vec<f64>,
    pub status: EvalStatus,
    pub f: f64,
    pub h: f64,
    /// Monotonically-assigned tag, used to reconstruct deterministic
    /// ordering for reproducibility given a fixed seed.
    pub tag: u64,
    /// Whether this evaluation counted against MAX_BB_EVAL.
    pub counted: bool,
}

impl Eval {
    pub fn pending(tag: u64) -> Self {
        Eval {
            raw_outputs: Vec::new(),
            status: EvalStatus::Pending,
            f: f64::INFINITY,
            h: f64::INFINITY,
            tag,
            counted: false,
        }
    }

    /// Derives `f` (objective) and `h` (aggregated constraint violation)
    /// from the raw output vector, per the data model's definition of `h`:
    /// sum of squared progressive-barrier violations, or +infinity if any
    /// extreme-barrier output is positive.
    pub fn from_outputs(raw_outputs: Vec<f64>, output_types: &[OutputType], tag: u64, counted: bool) -> Self {
        let mut f = f64::INFINITY;
        let mut h = 0.0;
        let mut extreme_violated = false;
        for (value, kind) in raw_outputs.iter().zip(output_types.iter()) {
            match kind {
                OutputType::Objective => f = *value,
                OutputType::ProgressiveBarrier => h += value.max(0.0).powi(2),
                OutputType::ExtremeBarrier => {
                    if *value > 0.0 {
                        extreme_violated = true;
                    }
                }
                OutputType::Extra => {}
            }
        }
        let (status, h) = if extreme_violated {
            (EvalStatus::Unusable, f64::INFINITY)
        } else {
            (EvalStatus::Ok, h)
        };
        Eval { raw_outputs, status, f, h, tag, counted }
    }

    pub fn failed(tag: u64) -> Self {
        Eval {
            raw_outputs: Vec::new(),
            status: EvalStatus::Failed,
            f: f64::INFINITY,
            h: f64::INFINITY,
            tag,
            counted: true,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.status == EvalStatus::Ok && self.h == 0.0
    }
}

/// A trial point plus one `Eval` slot per evaluator kind it has been
/// submitted to.
#[derive(Debug, Clone)]
pub struct EvalPoint {
    pub point: Point,
    pub direction: Option<Vec<f64>>,
    pub generating_step: &'static str,
    pub black_box: Option<Eval>,
    pub surrogate: Option<Eval>,
    pub model: Option<Eval>,
}

impl EvalPoint {
    pub fn new(point: Point, generating_step: &'static str) -> Self {
        EvalPoint { point, direction: None, generating_step, black_box: None, surrogate: None, model: None }
    }

    pub fn with_direction(mut self, direction: Vec<f64>) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn eval(&self, kind: EvaluatorKind) -> Option<&Eval> {
        match kind {
            EvaluatorKind::BlackBox => self.black_box.as_ref(),
            EvaluatorKind::Surrogate => self.surrogate.as_ref(),
            EvaluatorKind::Model => self.model.as_ref(),
        }
    }

    pub fn set_eval(&mut self, kind: EvaluatorKind, eval: Eval) {
        match kind {
            EvaluatorKind::BlackBox => self.black_box = Some(eval),
            EvaluatorKind::Surrogate => self.surrogate = Some(eval),
            EvaluatorKind::Model => self.model = Some(eval),
        }
    }

    pub fn f(&self, kind: EvaluatorKind) -> f64 {
        self.eval(kind).map(|e| e.f).unwrap_or(f64::INFINITY)
    }

    pub fn h(&self, kind: EvaluatorKind) -> f64 {
        self.eval(kind).map(|e| e.h).unwrap_or(f64::INFINITY)
    }
}
