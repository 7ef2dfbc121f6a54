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

//! Latin-hypercube search: samples `samples_per_iteration` points within
//! bounds, one per stratum per coordinate, at a density that grows with the
//! iteration counter so later iterations probe more finely.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::abstraction::search_method::{SearchMethod, SearchStrictness};
use crate::implementation::barrier::progressive::ProgressiveBarrier;
use crate::implementation::mesh::granular::GranularMesh;
use crate::implementation::point::Point;

pub struct LatinHypercubeSearch {
    base_samples: usize,
    rng: Mutex<StdRng>,
    iteration: AtomicUsize,
    center_fallback_radius: AtomicU64,
}

impl LatinHypercubeSearch {
    pub fn new(seed: u64, base_samples: usize) -> Self {
        LatinHypercubeSearch {
            base_samples: base_samples.max(1),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            iteration: AtomicUsize::new(0),
            center_fallback_radius: AtomicU64::new(10f64.to_bits()),
        }
    }

    pub fn advance_iteration(&self) {
        self.iteration.fetch_add(1, Ordering::Relaxed);
    }

    fn samples_for_current_iteration(&self) -> usize {
        let k = self.iteration.load(Ordering::Relaxed);
        self.base_samples + k
    }

    fn bracket(&self, lb: f64, ub: f64, frame: f64) -> (f64, f64) {
        if lb.is_finite() && ub.is_finite() {
            (lb, ub)
        } else {
            let radius = f64::from_bits(self.center_fallback_radius.load(Ordering::Relaxed)).max(frame);
            let lo = if lb.is_finite() { lb } else { -radius };
            let hi = if ub.is_finite() { ub } else { radius };
            (lo, hi)
        }
    }
}

impl SearchMethod for LatinHypercubeSearch {
    fn name(&self) -> &str {
        "latin-hypercube"
    }

    fn generate(&self, _barrier: &ProgressiveBarrier, mesh: &GranularMesh) -> Vec<Point> {
        let n = mesh.dimension();
        let m = self.samples_for_current_iteration();
        let lower = mesh.lower_bound();
        let upper = mesh.upper_bound();
        let frame = mesh.frame_size();

        let mut rng = self.rng.lock();
        let mut points = Vec::with_capacity(m);
        // one independent stratified permutation per coordinate
        let mut strata: Vec<Vec<usize>> = (0..n)
            .map(|_| {
                let mut s: Vec<usize> = (0..m).collect();
                for i in (1..m).rev() {
                    let j = rng.gen_range(0..=i);
                    s.swap(i, j);
                }
                s
            })
            .collect();

        for k in 0..m {
            let mut coords = Vec::with_capacity(n);
            for i in 0..n {
                let (lb, ub) = self.bracket(lower[i], upper[i], frame[i]);
                let stratum = strata[i][k];
                let width = (ub - lb) / m as f64;
                let offset: f64 = rng.gen_range(0.0..width.max(1e-12));
                coords.push(lb + stratum as f64 * width + offset);
            }
            points.push(mesh.project(&Point::from_values(&coords)));
        }
        let _ = strata.len(); // strata consumed above; keep borrow checker happy across loop
        points
    }

    fn strictness(&self) -> SearchStrictness {
        SearchStrictness::Lenient
    }

    fn on_iteration_end(&self) {
        self.advance_iteration();
    }
}

#[cfg(test)]
mod test_latin_hypercube_search {
    use super::*;
    use crate::common::EvaluatorKind;

    #[test]
    fn generates_the_requested_number_of_samples_within_bounds() {
        let search = LatinHypercubeSearch::new(7, 5);
        let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let mesh = GranularMesh::new(vec![0.0; 2], vec![-1.0, -1.0], vec![1.0, 1.0], 1.0, false, 0.1, None, None);
        let points = search.generate(&barrier, &mesh);
        assert_eq!(points.len(), 5);
        for p in &points {
            assert!(p.get(0).unwrap() >= -1.0 && p.get(0).unwrap() <= 1.0);
            assert!(p.get(1).unwrap() >= -1.0 && p.get(1).unwrap() <= 1.0);
        }
    }

    #[test]
    fn sample_count_grows_with_the_iteration_counter() {
        let search = LatinHypercubeSearch::new(1, 3);
        let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let mesh = GranularMesh::new(vec![0.0; 1], vec![-1.0], vec![1.0], 1.0, false, 0.1, None, None);
        assert_eq!(search.generate(&barrier, &mesh).len(), 3);
        search.advance_iteration();
        assert_eq!(search.generate(&barrier, &mesh).len(), 4);
    }

    #[test]
    fn unbounded_coordinates_fall_back_to_a_finite_bracket() {
        let search = LatinHypercubeSearch::new(2, 4);
        let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let mesh = GranularMesh::new(
            vec![0.0],
            vec![f64::NEG_INFINITY],
            vec![f64::INFINITY],
            1.0,
            false,
            0.1,
            None,
            None,
        );
        let points = search.generate(&barrier, &mesh);
        for p in &points {
            assert!(p.get(0).unwrap().is_finite());
        }
    }
}
