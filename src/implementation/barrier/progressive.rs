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

//! The single-objective progressive barrier (C4): tracks the best feasible
//! `x*` and best infeasible `x°` incumbents along with the monotone
//! threshold `hmax`, under a single mutex (section 5's "Barrier: single
//! mutex; updates serialised").

use log::debug;
use parking_lot::Mutex;

use crate::common::{EvaluatorKind, SuccessType};
use crate::implementation::cache::eval_point::EvalPoint;

struct Inner {
    best_feasible: Option<EvalPoint>,
    best_infeasible: Option<EvalPoint>,
    h_max: f64,
}

pub struct ProgressiveBarrier {
    inner: Mutex<Inner>,
    kind: EvaluatorKind,
}

impl ProgressiveBarrier {
    pub fn new(h_max_0: f64, kind: EvaluatorKind) -> Self {
        ProgressiveBarrier {
            inner: Mutex::new(Inner { best_feasible: None, best_infeasible: None, h_max: h_max_0 }),
            kind,
        }
    }

    /// Classifies `candidate` relative to the current incumbents and, if it
    /// advances the barrier, updates it in place. The whole operation runs
    /// under a single lock so concurrent arrivals serialise, which is what
    /// makes the result order-independent (section 5's ordering guarantee).
    pub fn update(&self, candidate: &EvalPoint) -> SuccessType {
        let eval = match candidate.eval(self.kind) {
            Some(e) => e,
            None => return SuccessType::Unsuccessful,
        };
        if eval.status != crate::common::EvalStatus::Ok {
            return SuccessType::Unsuccessful;
        }
        let h = eval.h;
        let f = eval.f;
        if h.is_infinite() {
            return SuccessType::Unsuccessful; // unusable
        }

        let mut inner = self.inner.lock();

        if h == 0.0 {
            let improves = match &inner.best_feasible {
                None => true,
                Some(incumbent) => f < incumbent.f(self.kind),
            };
            if improves {
                inner.best_feasible = Some(candidate.clone());
                debug!("barrier: new best feasible, f = {f}");
                self.promote_on_feasibility_locked(&mut inner, h);
                return SuccessType::FullSuccess;
            }
            return SuccessType::Unsuccessful;
        }

        if h <= inner.h_max {
            match &inner.best_infeasible {
                None => {
                    inner.best_infeasible = Some(candidate.clone());
                    inner.h_max = h;
                    debug!("barrier: first infeasible incumbent, h = {h}, hmax <- {h}");
                    return SuccessType::FullSuccess;
                }
                Some(incumbent) => {
                    let inc_f = incumbent.f(self.kind);
                    let inc_h = incumbent.h(self.kind);
                    let dominates = f <= inc_f && h <= inc_h && (f < inc_f || h < inc_h);
                    if dominates {
                        let previous_h = inc_h;
                        inner.best_infeasible = Some(candidate.clone());
                        inner.h_max = previous_h.min(inner.h_max);
                        debug!("barrier: new infeasible incumbent dominates, hmax <- {}", inner.h_max);
                        return SuccessType::FullSuccess;
                    }
                    let improves = h < inc_h && f > inc_f;
                    if improves {
                        return SuccessType::PartialSuccess;
                    }
                }
            }
        }
        SuccessType::Unsuccessful
    }

    /// When a point that used to be infeasible becomes feasible, hmax may
    /// be lowered to that point's prior h. Exposed separately for callers
    /// that re-evaluate a point under a refined model, in addition to being
    /// applied automatically inside `update` when a new x* is recorded.
    pub fn promote_on_feasibility(&self, prior_h: f64) {
        let mut inner = self.inner.lock();
        self.promote_on_feasibility_locked(&mut inner, prior_h);
    }

    fn promote_on_feasibility_locked(&self, inner: &mut Inner, prior_h: f64) {
        if prior_h > 0.0 && prior_h < inner.h_max {
            inner.h_max = prior_h;
        }
    }

    pub fn best_feasible(&self) -> Option<EvalPoint> {
        self.inner.lock().best_feasible.clone()
    }
    pub fn best_infeasible(&self) -> Option<EvalPoint> {
        self.inner.lock().best_infeasible.clone()
    }
    pub fn h_max(&self) -> f64 {
        self.inner.lock().h_max
    }
    pub fn is_feasible(&self) -> bool {
        self.inner.lock().best_feasible.is_some()
    }

    /// Frame centers for the next iteration: typically x* and x°, per
    /// section 4.7.
    pub fn frame_centers(&self) -> Vec<EvalPoint> {
        let inner = self.inner.lock();
        inner.best_feasible.iter().chain(inner.best_infeasible.iter()).cloned().collect()
    }

    /// Reinstates the incumbents and `hmax` from a hot-restart file, bypassing
    /// the usual `update()` classification since these are already-settled
    /// facts, not fresh candidates to compare against themselves.
    pub fn restore(&self, best_feasible: Option<EvalPoint>, best_infeasible: Option<EvalPoint>, h_max: f64) {
        let mut inner = self.inner.lock();
        inner.best_feasible = best_feasible;
        inner.best_infeasible = best_infeasible;
        inner.h_max = h_max;
    }
}

#[cfg(test)]
mod test_progressive_barrier {
    use super::*;
    use crate::implementation::cache::eval_point::Eval;
    use crate::implementation::point::Point;

    fn point(x: f64, f: f64, h: f64) -> EvalPoint {
        let mut ep = EvalPoint::new(Point::from_values(&[x]), "poll");
        ep.set_eval(
            EvaluatorKind::BlackBox,
            Eval { raw_outputs: vec![], status: crate::common::EvalStatus::Ok, f, h, tag: 0, counted: true },
        );
        ep
    }

    #[test]
    fn feasible_point_becomes_xstar_and_is_full_success() {
        let b = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let c = b.update(&point(0.0, 5.0, 0.0));
        assert_eq!(c, SuccessType::FullSuccess);
        assert_eq!(b.best_feasible().unwrap().f(EvaluatorKind::BlackBox), 5.0);
    }

    #[test]
    fn worse_feasible_point_is_unsuccessful() {
        let b = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        b.update(&point(0.0, 5.0, 0.0));
        let c = b.update(&point(1.0, 9.0, 0.0));
        assert_eq!(c, SuccessType::Unsuccessful);
        assert_eq!(b.best_feasible().unwrap().f(EvaluatorKind::BlackBox), 5.0);
    }

    #[test]
    fn hmax_is_monotone_non_increasing() {
        let b = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        b.update(&point(0.0, 10.0, 3.0));
        assert_eq!(b.h_max(), 3.0);
        // dominating infeasible point lowers hmax further
        b.update(&point(1.0, 9.0, 1.0));
        assert_eq!(b.h_max(), 1.0);
        // a worse infeasible point must not raise hmax back up
        b.update(&point(2.0, 20.0, 5.0));
        assert_eq!(b.h_max(), 1.0);
    }

    #[test]
    fn infeasible_point_above_hmax_is_unsuccessful() {
        let b = ProgressiveBarrier::new(2.0, EvaluatorKind::BlackBox);
        let c = b.update(&point(0.0, 1.0, 5.0));
        assert_eq!(c, SuccessType::Unsuccessful);
        assert!(b.best_infeasible().is_none());
    }

    #[test]
    fn improving_but_not_dominating_is_partial_success() {
        let b = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        b.update(&point(0.0, 5.0, 3.0));
        // lower h but worse f: improves without dominating
        let c = b.update(&point(1.0, 9.0, 1.0));
        assert_eq!(c, SuccessType::PartialSuccess);
    }
}
