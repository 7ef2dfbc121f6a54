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

//! The Poll step (C6): builds a rigorous positive spanning set of
//! directions around a random orthonormal basis, scaled to the current
//! frame size, and projects the resulting trial points onto the mesh.

use rand::Rng;

use crate::common::DirectionType;
use crate::implementation::mesh::granular::GranularMesh;
use crate::implementation::numeric::{householder_basis, random_unit_direction};
use crate::implementation::point::Point;

/// Builds the unscaled direction family: `2n` directions (basis columns and
/// their negations) for `Ortho2N`, or `n+1` directions (the basis columns
/// plus their negated sum, a minimal positive basis) for `OrthoNPlus1`.
pub fn poll_directions(n: usize, direction_type: DirectionType, rng: &mut impl Rng) -> Vec<Vec<f64>> {
    let dir = random_unit_direction(n, rng);
    let basis = householder_basis(&dir);
    match direction_type {
        DirectionType::Ortho2N => {
            let mut directions = Vec::with_capacity(2 * n);
            for col in &basis {
                directions.push(col.clone());
                directions.push(col.iter().map(|x| -x).collect());
            }
            directions
        }
        DirectionType::OrthoNPlus1 => {
            let mut directions = basis.clone();
            let mut last = vec![0.0; n];
            for col in &basis {
                for (l, c) in last.iter_mut().zip(col.iter()) {
                    *l -= c;
                }
            }
            directions.push(last);
            directions
        }
    }
}

/// Scales each direction by the frame size (coordinate-wise), applies it to
/// `center`, and projects the result onto the mesh. Fixed or undefined
/// coordinates of `center` are left untouched by `GranularMesh::project`.
pub fn poll_points(center: &Point, directions: &[Vec<f64>], mesh: &GranularMesh) -> Vec<Point> {
    let frame = mesh.frame_size();
    directions
        .iter()
        .map(|d| {
            let scaled: Vec<f64> = d.iter().zip(frame.iter()).map(|(di, fi)| di * fi).collect();
            mesh.project(&center.add_direction(&scaled))
        })
        .collect()
}

/// Reorders `directions` so that the one most aligned (highest cosine
/// similarity) with `last_success` is tried first: the direction that paid
/// off last time is the most promising place to look again.
pub fn order_by_last_success(mut directions: Vec<Vec<f64>>, last_success: Option<&[f64]>) -> Vec<Vec<f64>> {
    if let Some(ls) = last_success {
        let norm_ls = crate::implementation::numeric::norm2(ls).max(1e-12);
        directions.sort_by(|a, b| {
            let cos_a = cosine(a, ls, norm_ls);
            let cos_b = cosine(b, ls, norm_ls);
            cos_b.partial_cmp(&cos_a).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    directions
}

fn cosine(d: &[f64], ls: &[f64], norm_ls: f64) -> f64 {
    let dot: f64 = d.iter().zip(ls.iter()).map(|(a, b)| a * b).sum();
    let norm_d = crate::implementation::numeric::norm2(d).max(1e-12);
    dot / (norm_d * norm_ls)
}

#[cfg(test)]
mod test_orthogonal_poll {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ortho_2n_yields_2n_directions_forming_a_positive_spanning_set() {
        let mut rng = StdRng::seed_from_u64(1);
        let directions = poll_directions(3, DirectionType::Ortho2N, &mut rng);
        assert_eq!(directions.len(), 6);
        // sum of all directions is zero: +-v pairs cancel exactly.
        let mut sum = vec![0.0; 3];
        for d in &directions {
            for (s, x) in sum.iter_mut().zip(d.iter()) {
                *s += x;
            }
        }
        for s in sum {
            assert!(s.abs() < 1e-9);
        }
    }

    #[test]
    fn ortho_n_plus_1_yields_n_plus_1_directions_summing_to_zero() {
        let mut rng = StdRng::seed_from_u64(2);
        let directions = poll_directions(4, DirectionType::OrthoNPlus1, &mut rng);
        assert_eq!(directions.len(), 5);
        let mut sum = vec![0.0; 4];
        for d in &directions {
            for (s, x) in sum.iter_mut().zip(d.iter()) {
                *s += x;
            }
        }
        for s in sum {
            assert!(s.abs() < 1e-9, "positive basis must sum to zero, got {s}");
        }
    }

    #[test]
    fn poll_points_land_on_the_mesh() {
        let mesh = GranularMesh::new(vec![0.0; 2], vec![-10.0; 2], vec![10.0; 2], 1.0, false, 0.1, None, None);
        let mut rng = StdRng::seed_from_u64(3);
        let directions = poll_directions(2, DirectionType::Ortho2N, &mut rng);
        let center = Point::from_values(&[0.0, 0.0]);
        let points = poll_points(&center, &directions, &mesh);
        for p in &points {
            let projected = mesh.project(p);
            assert_eq!(p, &projected, "poll points must already lie on the mesh");
        }
    }

    #[test]
    fn order_by_last_success_puts_the_aligned_direction_first() {
        let directions = vec![vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.0, 1.0], vec![0.0, -1.0]];
        let ordered = order_by_last_success(directions, Some(&[1.0, 0.0]));
        assert_eq!(ordered[0], vec![1.0, 0.0]);
    }
}
