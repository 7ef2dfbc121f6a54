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

//! `Cache` (C3): the thread-safe, content-addressed store of evaluated
//! points, backed by a `dashmap::DashMap` keyed by `Point` (as the teacher's
//! `SimpleCache` keys its per-layer maps by state) with an `fxhash` hasher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use fxhash::FxBuildHasher;
use log::trace;
use parking_lot::Mutex;

use crate::common::EvaluatorKind;
use crate::implementation::cache::eval_point::{Eval, EvalPoint};
use crate::implementation::point::Point;

pub type CacheEntry = Arc<Mutex<EvalPoint>>;

pub struct Cache {
    entries: DashMap<Point, CacheEntry, FxBuildHasher>,
    tag_counter: AtomicU64,
    cache_hits: AtomicU64,
    counted_bb_evals: AtomicU64,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        Cache {
            entries: DashMap::with_hasher(FxBuildHasher::default()),
            tag_counter: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            counted_bb_evals: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Number of black-box evaluations that counted against MAX_BB_EVAL,
    /// distinct from `len()` (distinct cached points) and `cache_hits()`
    /// (points served without a fresh evaluation).
    pub fn counted_bb_evals(&self) -> u64 {
        self.counted_bb_evals.load(Ordering::Relaxed)
    }

    /// Bumps the counted-evaluation counter; called by the queue once, for
    /// each completed evaluation whose `Eval::counted` flag is set. Not
    /// called from `record` itself so that restoring a cache from disk
    /// (`cache_file::load`) never inflates it.
    pub fn record_counted_bb_eval(&self) {
        self.counted_bb_evals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn find(&self, point: &Point) -> Option<CacheEntry> {
        self.entries.get(point).map(|e| e.clone())
    }

    /// Drops a point's cache cell entirely. Used to undo a `smart_insert`
    /// whose pending slot was never evaluated (opportunistic cancellation),
    /// so the point is treated as if it had never been generated.
    pub fn remove(&self, point: &Point) {
        self.entries.remove(point);
    }

    /// The cache's key operation (C3): if `point` is absent, insert it with
    /// a fresh `Pending` eval for `kind` and return `needs_evaluation =
    /// true`. If it is present and already evaluated for `kind`, bump the
    /// cache-hit counter and return `needs_evaluation = false`.
    pub fn smart_insert(
        &self,
        point: Point,
        generating_step: &'static str,
        kind: EvaluatorKind,
    ) -> (CacheEntry, bool) {
        use dashmap::mapref::entry::Entry;
        match self.entries.entry(point.clone()) {
            Entry::Occupied(occ) => {
                let cell = occ.get().clone();
                let needs_evaluation = {
                    let guard = cell.lock();
                    match guard.eval(kind) {
                        None => true,
                        Some(e) => e.status == crate::common::EvalStatus::Pending,
                    }
                };
                if !needs_evaluation {
                    self.cache_hits.fetch_add(1, Ordering::Relaxed);
                    trace!("cache hit for an already-evaluated point");
                } else if guard_needs_pending_tag(&cell, kind) {
                    let tag = self.tag_counter.fetch_add(1, Ordering::Relaxed);
                    cell.lock().set_eval(kind, Eval::pending(tag));
                }
                (cell, needs_evaluation)
            }
            Entry::Vacant(vac) => {
                let tag = self.tag_counter.fetch_add(1, Ordering::Relaxed);
                let mut ep = EvalPoint::new(point, generating_step);
                ep.set_eval(kind, Eval::pending(tag));
                let cell = Arc::new(Mutex::new(ep));
                vac.insert(cell.clone());
                (cell, true)
            }
        }
    }

    pub fn record(&self, point: &Point, kind: EvaluatorKind, eval: Eval) {
        if let Some(cell) = self.find(point) {
            cell.lock().set_eval(kind, eval);
        }
    }

    pub fn next_tag(&self) -> u64 {
        self.tag_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Best feasible point (h == 0) minimising f, under `kind`.
    pub fn best_feasible(&self, kind: EvaluatorKind) -> Option<EvalPoint> {
        self.scan_best(kind, |e| e.is_feasible(), |e| e.f)
    }

    /// Best infeasible point with h in (0, hmax], minimising h then f.
    pub fn best_infeasible(&self, kind: EvaluatorKind, hmax: f64) -> Option<EvalPoint> {
        self.scan_best(
            kind,
            move |e| e.status == crate::common::EvalStatus::Ok && e.h > 0.0 && e.h <= hmax,
            |e| e.h,
        )
    }

    fn scan_best(
        &self,
        kind: EvaluatorKind,
        predicate: impl Fn(&Eval) -> bool,
        key: impl Fn(&Eval) -> f64,
    ) -> Option<EvalPoint> {
        let mut best: Option<(f64, f64, EvalPoint)> = None;
        for entry in self.entries.iter() {
            let guard = entry.value().lock();
            if let Some(eval) = guard.eval(kind) {
                if predicate(eval) {
                    let k = key(eval);
                    let f = eval.f;
                    let better = match &best {
                        None => true,
                        Some((bk, bf, _)) => k < *bk || (k == *bk && f < *bf),
                    };
                    if better {
                        best = Some((k, f, guard.clone()));
                    }
                }
            }
        }
        best.map(|(_, _, ep)| ep)
    }

    /// Range scan by predicate, used by trust-region model builders and the
    /// surrogate sort key.
    pub fn range_scan(&self, predicate: impl Fn(&EvalPoint) -> bool) -> Vec<EvalPoint> {
        self.entries
            .iter()
            .filter_map(|e| {
                let guard = e.value().lock();
                predicate(&guard).then(|| guard.clone())
            })
            .collect()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Evicts the lowest-tag (oldest) entries down to `max_size`, excluding
    /// any point in `preserve` (x\* / x° in the barrier). "Naive" eviction
    /// per the design notes' open question: order beyond oldest-first /
    /// preserve-incumbents is unspecified.
    pub fn evict_to(&self, max_size: usize, preserve: &[Point], kind: EvaluatorKind) {
        if self.entries.len() <= max_size {
            return;
        }
        let mut candidates: Vec<(u64, Point)> = self
            .entries
            .iter()
            .filter(|e| !preserve.contains(e.key()))
            .filter_map(|e| {
                let guard = e.value().lock();
                guard.eval(kind).map(|ev| (ev.tag, e.key().clone()))
            })
            .collect();
        candidates.sort_by_key(|(tag, _)| *tag);
        let to_remove = self.entries.len().saturating_sub(max_size);
        for (_, point) in candidates.into_iter().take(to_remove) {
            self.entries.remove(&point);
        }
    }

    pub fn snapshot(&self) -> Vec<EvalPoint> {
        self.entries.iter().map(|e| e.value().lock().clone()).collect()
    }
}

/// `smart_insert`'s occupied branch decides whether a brand-new pending
/// slot must be allocated for `kind` on a point that already exists for a
/// *different* kind; this is the only caller, kept out-of-line so the main
/// transaction body above stays readable.
fn guard_needs_pending_tag(cell: &CacheEntry, kind: EvaluatorKind) -> bool {
    cell.lock().eval(kind).is_none()
}

#[cfg(test)]
mod test_cache {
    use super::*;
    use crate::common::EvalStatus;
    use crate::implementation::point::Point;

    #[test]
    fn smart_insert_reports_needs_evaluation_once() {
        let cache = Cache::new();
        let p = Point::from_values(&[1.0, 2.0]);
        let (cell, needs) = cache.smart_insert(p.clone(), "poll", EvaluatorKind::BlackBox);
        assert!(needs);
        cell.lock().set_eval(
            EvaluatorKind::BlackBox,
            Eval { status: EvalStatus::Ok, f: 1.0, h: 0.0, tag: 0, counted: true, raw_outputs: vec![] },
        );
        let (_, needs_again) = cache.smart_insert(p, "poll", EvaluatorKind::BlackBox);
        assert!(!needs_again);
        assert_eq!(cache.cache_hits(), 1);
    }

    #[test]
    fn cache_uniqueness_one_entry_per_point() {
        let cache = Cache::new();
        let p = Point::from_values(&[0.0, 0.0]);
        cache.smart_insert(p.clone(), "poll", EvaluatorKind::BlackBox);
        cache.smart_insert(p.clone(), "search", EvaluatorKind::BlackBox);
        cache.smart_insert(p, "poll", EvaluatorKind::BlackBox);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn best_feasible_picks_minimal_f() {
        let cache = Cache::new();
        for (x, f) in [(0.0, 5.0), (1.0, 2.0), (2.0, 8.0)] {
            let p = Point::from_values(&[x]);
            let (cell, _) = cache.smart_insert(p, "poll", EvaluatorKind::BlackBox);
            cell.lock().set_eval(
                EvaluatorKind::BlackBox,
                Eval { status: EvalStatus::Ok, f, h: 0.0, tag: 0, counted: true, raw_outputs: vec![] },
            );
        }
        let best = cache.best_feasible(EvaluatorKind::BlackBox).unwrap();
        assert_eq!(best.f(EvaluatorKind::BlackBox), 2.0);
    }

    #[test]
    fn eviction_preserves_listed_points() {
        let cache = Cache::new();
        let mut points = Vec::new();
        for x in 0..5 {
            let p = Point::from_values(&[x as f64]);
            let (cell, _) = cache.smart_insert(p.clone(), "poll", EvaluatorKind::BlackBox);
            cell.lock().set_eval(
                EvaluatorKind::BlackBox,
                Eval { status: EvalStatus::Ok, f: x as f64, h: 0.0, tag: x as u64, counted: true, raw_outputs: vec![] },
            );
            points.push(p);
        }
        let preserve = vec![points[0].clone()];
        cache.evict_to(2, &preserve, EvaluatorKind::BlackBox);
        assert!(cache.find(&points[0]).is_some());
        assert!(cache.len() <= 3); // 2 kept + 1 preserved, at most
    }
}
