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

//! The granular mesh (C2): per-coordinate mesh size δ and frame size Δ,
//! both parameterised by an integer mesh index `r`, plus the bounds used by
//! `project`.

use std::collections::HashSet;

use crate::implementation::numeric::{clip, round_to_multiple};
use crate::implementation::point::Point;

/// Caps how far `enlarge` may push a mesh index, purely defensive — nothing
/// in the spec requires a bound, but an unbounded `r` would eventually
/// overflow `4.0f64.powi`.
const MAX_MESH_INDEX: i64 = 1000;

#[derive(Debug, Clone)]
pub struct GranularMesh {
    n: usize,
    base: f64,
    granularity: Vec<f64>,
    lower_bound: Vec<f64>,
    upper_bound: Vec<f64>,
    fixed: Vec<bool>,
    /// Mesh index per coordinate; `delta_i = f(r_i)`.
    r: Vec<i64>,
    anisotropic: bool,
    anisotropic_ratio: f64,
    min_mesh_size: Option<f64>,
    min_frame_size: Option<f64>,
}

impl GranularMesh {
    pub fn new(
        granularity: Vec<f64>,
        lower_bound: Vec<f64>,
        upper_bound: Vec<f64>,
        initial_frame_size: f64,
        anisotropic: bool,
        anisotropic_ratio: f64,
        min_mesh_size: Option<f64>,
        min_frame_size: Option<f64>,
    ) -> Self {
        let n = granularity.len();
        assert_eq!(lower_bound.len(), n);
        assert_eq!(upper_bound.len(), n);
        let base = 4.0;
        // Choose the initial index so that the frame size is close to
        // `initial_frame_size`: Delta(r) == base^r for r >= 0, so invert.
        let r0 = if initial_frame_size > 1.0 {
            (initial_frame_size.ln() / base.ln()).round() as i64
        } else {
            0
        };
        GranularMesh {
            n,
            base,
            granularity,
            lower_bound,
            upper_bound,
            fixed: vec![false; n],
            r: vec![r0; n],
            anisotropic,
            anisotropic_ratio,
            min_mesh_size,
            min_frame_size,
        }
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn lower_bound(&self) -> &[f64] {
        &self.lower_bound
    }

    pub fn upper_bound(&self) -> &[f64] {
        &self.upper_bound
    }

    pub fn set_fixed(&mut self, i: usize, fixed: bool) {
        self.fixed[i] = fixed;
    }

    /// The per-coordinate mesh index `r`, the only state a hot-restart
    /// needs to reinstate the mesh exactly (bounds, granularity, and the
    /// other construction parameters are read from `Parameters` again).
    pub fn mesh_indices(&self) -> &[i64] {
        &self.r
    }

    pub fn set_mesh_indices(&mut self, r: Vec<i64>) {
        assert_eq!(r.len(), self.n);
        self.r = r;
    }

    /// Floor mesh index for coordinate `i`: granular coordinates cannot
    /// refine below their granularity, so their floor is `0` (where
    /// `delta == granularity`); continuous coordinates have no floor.
    fn floor_index(&self, i: usize) -> i64 {
        if self.granularity[i] > 0.0 {
            0
        } else {
            i64::MIN / 2
        }
    }

    fn delta_at(&self, i: usize, r: i64) -> f64 {
        let g = self.granularity[i];
        if g > 0.0 {
            g * self.base.powi(r.max(0) as i32)
        } else {
            self.base.powi(r as i32)
        }
    }

    fn frame_exponent(&self, r: i64) -> i64 {
        if r >= 0 {
            r
        } else {
            // ceil(r / 2): frame shrinks at half the rate of the mesh once
            // refinement drives r negative, so Delta/delta grows without
            // bound as r -> -infinity while staying == 1 at r == 0.
            -((-r) / 2)
        }
    }

    fn delta_frame_at(&self, i: usize, r: i64) -> f64 {
        let g = self.granularity[i];
        let ef = self.frame_exponent(r);
        let raw = if g > 0.0 {
            g * self.base.powi(ef.max(0) as i32)
        } else {
            self.base.powi(ef as i32)
        };
        raw.max(self.delta_at(i, r))
    }

    pub fn mesh_size(&self) -> Vec<f64> {
        (0..self.n).map(|i| self.delta_at(i, self.r[i])).collect()
    }

    pub fn frame_size(&self) -> Vec<f64> {
        (0..self.n).map(|i| self.delta_frame_at(i, self.r[i])).collect()
    }

    /// For each `i`, `r_i += 1` (capped), except when anisotropic mesh is
    /// enabled and a success direction `d` is supplied: then only
    /// coordinates whose relative displacement exceeds
    /// `anisotropic_ratio` are enlarged.
    pub fn enlarge(&mut self, success_direction: Option<&[f64]>) {
        let delta_before = self.frame_size();
        for i in 0..self.n {
            if self.fixed[i] {
                continue;
            }
            let should_enlarge = match (self.anisotropic, success_direction) {
                (true, Some(d)) => {
                    let frame = delta_before[i].max(f64::EPSILON);
                    (d[i].abs() / frame) > self.anisotropic_ratio
                }
                _ => true,
            };
            if should_enlarge {
                self.r[i] = (self.r[i] + 1).min(MAX_MESH_INDEX);
            }
        }
    }

    /// For each non-fixed coordinate, `r_i -= 1`, floored per coordinate.
    /// Returns the set of coordinate indices that hit their floor on this
    /// call.
    pub fn refine(&mut self) -> HashSet<usize> {
        let mut hit_floor = HashSet::new();
        for i in 0..self.n {
            if self.fixed[i] {
                continue;
            }
            let floor = self.floor_index(i);
            let next = self.r[i] - 1;
            if next < floor {
                hit_floor.insert(i);
                self.r[i] = floor;
            } else {
                self.r[i] = next;
            }
        }
        hit_floor
    }

    /// Snap every defined coordinate to the nearest multiple of δᵢ, clip to
    /// bounds, and pull back inside if the clip left it within ½δᵢ of the
    /// boundary (so the projected point, which must be exactly on the
    /// mesh, is not pushed back out by the bound).
    pub fn project(&self, p: &Point) -> Point {
        let delta = self.mesh_size();
        let mut coords = Vec::with_capacity(self.n);
        for i in 0..self.n {
            let c = match p.get(i) {
                None => {
                    coords.push(None);
                    continue;
                }
                Some(v) => v,
            };
            if self.fixed[i] {
                coords.push(Some(c));
                continue;
            }
            let lb = self.lower_bound[i];
            let ub = self.upper_bound[i];
            let mut snapped = round_to_multiple(c, delta[i]);
            if snapped < lb && lb - snapped < 0.5 * delta[i] {
                snapped = round_to_multiple(lb, delta[i]).max(snapped);
            }
            if snapped > ub && snapped - ub < 0.5 * delta[i] {
                snapped = round_to_multiple(ub, delta[i]).min(snapped);
            }
            snapped = clip(snapped, lb, ub);
            coords.push(Some(snapped));
        }
        Point::new(coords)
    }

    /// `true` if some active (non-fixed) coordinate is at its refinement
    /// floor, or the global MIN_MESH_SIZE / MIN_FRAME_SIZE thresholds have
    /// been crossed.
    pub fn check_termination(&self) -> bool {
        let delta = self.mesh_size();
        let frame = self.frame_size();
        for i in 0..self.n {
            if self.fixed[i] {
                continue;
            }
            if self.r[i] <= self.floor_index(i) && self.granularity[i] > 0.0 {
                return true;
            }
            if let Some(min_d) = self.min_mesh_size {
                if delta[i] <= min_d {
                    return true;
                }
            }
            if let Some(min_f) = self.min_frame_size {
                if frame[i] <= min_f {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod test_granular_mesh {
    use super::*;

    fn mesh(n: usize) -> GranularMesh {
        GranularMesh::new(
            vec![0.0; n],
            vec![-10.0; n],
            vec![10.0; n],
            1.0,
            false,
            0.1,
            None,
            None,
        )
    }

    #[test]
    fn frame_ge_mesh_holds_across_refine_and_enlarge() {
        let mut m = mesh(3);
        for _ in 0..10 {
            m.refine();
            let d = m.mesh_size();
            let f = m.frame_size();
            for i in 0..3 {
                assert!(f[i] >= d[i] - 1e-12, "Delta >= delta violated at {i}");
            }
        }
        for _ in 0..10 {
            m.enlarge(None);
            let d = m.mesh_size();
            let f = m.frame_size();
            for i in 0..3 {
                assert!(f[i] >= d[i] - 1e-12);
            }
        }
    }

    #[test]
    fn refine_strictly_decreases_mesh_size_until_floor() {
        let mut m = mesh(2);
        let mut prev = m.mesh_size();
        for _ in 0..5 {
            m.refine();
            let now = m.mesh_size();
            for i in 0..2 {
                assert!(now[i] < prev[i], "{now:?} should be < {prev:?}");
            }
            prev = now;
        }
    }

    #[test]
    fn granular_coordinate_floors_at_granularity() {
        let mut m = GranularMesh::new(
            vec![0.5],
            vec![-10.0],
            vec![10.0],
            1.0,
            false,
            0.1,
            None,
            None,
        );
        let mut floored = false;
        for _ in 0..20 {
            let hit = m.refine();
            if !hit.is_empty() {
                floored = true;
                assert_eq!(m.mesh_size()[0], 0.5);
            }
        }
        assert!(floored, "a granular coordinate must eventually hit its floor");
    }

    #[test]
    fn project_is_idempotent() {
        let m = mesh(2);
        let p = Point::from_values(&[3.37, -1.21]);
        let once = m.project(&p);
        let twice = m.project(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn project_respects_bounds() {
        let m = mesh(1);
        let p = Point::from_values(&[1000.0]);
        let projected = m.project(&p);
        assert!(projected.get(0).unwrap() <= 10.0);
    }

    #[test]
    fn anisotropic_enlarge_only_widens_dominant_coordinates() {
        let mut m = GranularMesh::new(
            vec![0.0, 0.0],
            vec![-10.0, -10.0],
            vec![10.0, 10.0],
            1.0,
            true,
            0.1,
            None,
            None,
        );
        let before = m.frame_size();
        // direction dominated by coordinate 0
        m.enlarge(Some(&[1.0, 0.0001]));
        let after = m.frame_size();
        assert!(after[0] > before[0]);
        assert!((after[1] - before[1]).abs() < 1e-12);
    }
}
