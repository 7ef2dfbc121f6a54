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

//! Small value types shared by every other module: the per-coordinate input
//! classification, output classification, success classification returned by
//! the barrier, and the stop-reason tree.

use std::fmt;

/// The kind of a problem coordinate, fixed for the whole run after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    Continuous,
    Integer,
    Binary,
    Categorical,
}

/// The role a single black-box output column plays when deriving `f` and `h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    Objective,
    ProgressiveBarrier,
    ExtremeBarrier,
    Extra,
}

/// Which evaluator produced an `Eval` record: the real black box, a cheap
/// static surrogate, or a local quadratic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluatorKind {
    BlackBox,
    Surrogate,
    Model,
}

/// Status of a single evaluation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalStatus {
    Pending,
    Ok,
    Failed,
    Rejected,
    Unusable,
    Cancelled,
}

/// Outcome of classifying a freshly evaluated point against the barrier.
///
/// Ordered so that `FullSuccess > PartialSuccess > Unsuccessful`; this lets
/// an iteration take the best classification among several candidates with a
/// plain `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SuccessType {
    Unsuccessful,
    PartialSuccess,
    FullSuccess,
}
impl SuccessType {
    pub fn is_success(self) -> bool {
        self != SuccessType::Unsuccessful
    }
}
impl Default for SuccessType {
    fn default() -> Self {
        SuccessType::Unsuccessful
    }
}

/// Two positive spanning direction families the Poll step knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionType {
    Ortho2N,
    OrthoNPlus1,
}
impl Default for DirectionType {
    fn default() -> Self {
        DirectionType::Ortho2N
    }
}

/// The hierarchical stop reason. A run terminates as soon as either the
/// global slot or the algorithm-local slot holds anything but `Started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Sentinel meaning "no stop condition has been observed yet".
    Started,
    MeshMinimized,
    MaxBbEval,
    MaxEval,
    MaxTime,
    UserInterrupt,
    UserCallbackStop,
    AllPointsEvaluated,
    FeasibilityTargetReached,
    MaxIterations,
}
impl StopReason {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StopReason::Started)
    }
}
impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Started => "started",
            StopReason::MeshMinimized => "reached min mesh",
            StopReason::MaxBbEval => "max black-box evaluations",
            StopReason::MaxEval => "max evaluations",
            StopReason::MaxTime => "max time",
            StopReason::UserInterrupt => "user interrupt",
            StopReason::UserCallbackStop => "user callback requested stop",
            StopReason::AllPointsEvaluated => "all points evaluated",
            StopReason::FeasibilityTargetReached => "feasibility target reached",
            StopReason::MaxIterations => "max iterations",
        };
        f.write_str(s)
    }
}

/// Combines a global (shared across nested algorithms) and a local stop slot.
/// `terminate()` is the disjunction the spec calls for: `global ∨ local`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopReasonTree {
    global: Option<StopReason>,
    local: Option<StopReason>,
}
impl StopReasonTree {
    pub fn new() -> Self {
        Self { global: None, local: None }
    }
    pub fn set_global(&mut self, reason: StopReason) {
        if self.global.is_none() {
            self.global = Some(reason);
        }
    }
    pub fn set_local(&mut self, reason: StopReason) {
        if self.local.is_none() {
            self.local = Some(reason);
        }
    }
    pub fn terminate(&self) -> bool {
        self.global.is_some() || self.local.is_some()
    }
    /// The reason that actually tripped termination, global taking priority
    /// since it may have been raised by a nested sub-algorithm.
    pub fn reason(&self) -> Option<StopReason> {
        self.global.or(self.local)
    }
}

#[cfg(test)]
mod test_common {
    use super::*;

    #[test]
    fn success_type_ordering() {
        assert!(SuccessType::FullSuccess > SuccessType::PartialSuccess);
        assert!(SuccessType::PartialSuccess > SuccessType::Unsuccessful);
    }

    #[test]
    fn stop_reason_tree_disjunction() {
        let mut t = StopReasonTree::new();
        assert!(!t.terminate());
        t.set_local(StopReason::MeshMinimized);
        assert!(t.terminate());
        assert_eq!(t.reason(), Some(StopReason::MeshMinimized));
        // global, once set, takes priority when reading back the reason
        t.set_global(StopReason::MaxBbEval);
        assert_eq!(t.reason(), Some(StopReason::MaxBbEval));
    }

    #[test]
    fn stop_reason_tree_first_writer_wins() {
        let mut t = StopReasonTree::new();
        t.set_local(StopReason::MeshMinimized);
        t.set_local(StopReason::MaxTime);
        assert_eq!(t.reason(), Some(StopReason::MeshMinimized));
    }
}
