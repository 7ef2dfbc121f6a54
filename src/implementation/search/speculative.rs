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

//! Speculative search: extends the last successful step by a fixed factor
//! past the frame boundary, betting that whatever direction just paid off
//! will keep paying off.

use parking_lot::Mutex;

use crate::abstraction::search_method::{SearchMethod, SearchStrictness};
use crate::implementation::barrier::progressive::ProgressiveBarrier;
use crate::implementation::mesh::granular::GranularMesh;
use crate::implementation::point::Point;

pub struct SpeculativeSearch {
    factor: f64,
    last_success: Mutex<Option<(Point, Vec<f64>)>>,
}

impl SpeculativeSearch {
    pub fn new(factor: f64) -> Self {
        SpeculativeSearch { factor, last_success: Mutex::new(None) }
    }

    /// Called by the Mega-Iteration after a successful Poll/Search step, so
    /// the next Search call has something to extend.
    pub fn record_success(&self, frame_center: Point, direction: Vec<f64>) {
        *self.last_success.lock() = Some((frame_center, direction));
    }
}

impl SearchMethod for SpeculativeSearch {
    fn name(&self) -> &str {
        "speculative"
    }

    fn generate(&self, _barrier: &ProgressiveBarrier, mesh: &GranularMesh) -> Vec<Point> {
        let guard = self.last_success.lock();
        match &*guard {
            None => Vec::new(),
            Some((center, direction)) => {
                let extended: Vec<f64> = direction.iter().map(|d| d * self.factor).collect();
                vec![mesh.project(&center.add_direction(&extended))]
            }
        }
    }

    fn strictness(&self) -> SearchStrictness {
        SearchStrictness::Lenient
    }

    fn on_success(&self, frame_center: &Point, direction: &[f64]) {
        self.record_success(frame_center.clone(), direction.to_vec());
    }
}

#[cfg(test)]
mod test_speculative_search {
    use super::*;
    use crate::common::EvaluatorKind;

    #[test]
    fn without_a_recorded_success_it_proposes_nothing() {
        let search = SpeculativeSearch::new(2.0);
        let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let mesh = GranularMesh::new(vec![0.0; 2], vec![-10.0; 2], vec![10.0; 2], 1.0, false, 0.1, None, None);
        assert!(search.generate(&barrier, &mesh).is_empty());
    }

    #[test]
    fn after_a_success_it_extends_past_it() {
        let search = SpeculativeSearch::new(2.0);
        search.record_success(Point::from_values(&[0.0, 0.0]), vec![1.0, 0.0]);
        let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let mesh = GranularMesh::new(vec![0.0; 2], vec![-10.0; 2], vec![10.0; 2], 1.0, false, 0.1, None, None);
        let points = search.generate(&barrier, &mesh);
        assert_eq!(points.len(), 1);
        assert!(points[0].get(0).unwrap() > 1.0);
    }
}
