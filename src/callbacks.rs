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

//! User callbacks (C10): a struct of optional closures, one per hook point.
//! Registration is by field assignment rather than by an enum-dispatched
//! virtual call, so adding a new hook never breaks an existing caller.

use crate::common::SuccessType;
use crate::implementation::cache::eval_point::EvalPoint;
use crate::implementation::point::Point;

/// One callback per hook point named in the component table. Every field
/// defaults to `None`; a run with no callbacks registered behaves exactly
/// as if this struct did not exist.
#[derive(Default)]
pub struct Callbacks {
    /// Invoked just before a trial point is handed to the black box. May be
    /// used for auditing; cannot veto the evaluation.
    pub pre_eval: Option<Box<dyn Fn(&Point) + Send + Sync>>,

    /// Invoked right after a black-box outcome is recorded in the Cache.
    pub post_eval: Option<Box<dyn Fn(&EvalPoint) + Send + Sync>>,

    /// Invoked by the Queue after each dispatched block; returning `true`
    /// tells the dispatcher opportunism has been satisfied even if the
    /// barrier itself did not register a success.
    pub opportunistic_check: Option<Box<dyn Fn(&[EvalPoint]) -> bool + Send + Sync>>,

    /// Invoked when the black box reports a failure; returning `true` asks
    /// the driver to treat repeated failures as a fatal stop condition.
    pub fail_check: Option<Box<dyn Fn(&Point) -> bool + Send + Sync>>,

    /// Invoked at the end of every Mega-Iteration with its aggregated
    /// success classification; returning `true` requests the algorithm
    /// stop slot be set.
    pub mega_iteration_end: Option<Box<dyn Fn(SuccessType) -> bool + Send + Sync>>,

    /// Lets a caller supply extra poll directions alongside the rigorous
    /// ones, e.g. to inject domain knowledge.
    pub user_poll_directions: Option<Box<dyn Fn(&Point) -> Vec<Vec<f64>> + Send + Sync>>,

    /// Lets a caller supply extra search points alongside the registered
    /// `SearchMethod`s.
    pub user_search_points: Option<Box<dyn Fn(&Point) -> Vec<Point> + Send + Sync>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod test_callbacks {
    use super::*;

    #[test]
    fn unset_hooks_are_all_none_by_default() {
        let cb = Callbacks::new();
        assert!(cb.pre_eval.is_none());
        assert!(cb.mega_iteration_end.is_none());
    }

    #[test]
    fn a_registered_hook_runs() {
        let mut cb = Callbacks::new();
        cb.mega_iteration_end = Some(Box::new(|s| s == SuccessType::FullSuccess));
        assert!((cb.mega_iteration_end.as_ref().unwrap())(SuccessType::FullSuccess));
        assert!(!(cb.mega_iteration_end.as_ref().unwrap())(SuccessType::Unsuccessful));
    }
}
